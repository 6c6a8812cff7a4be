//! Shared harness for the integration tests: a throwaway SQLite database per test and
//! a scripted fulfillment provider.
pub mod mock_provider;

use rand::Rng;
use storefront_engine::{db_types::ProductSnapshot, SqliteDatabase};

pub async fn prepare_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let n: u64 = rand::thread_rng().gen();
    let url = format!("sqlite:///tmp/storefront_test_{n}.db?mode=rwc");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Could not create test database");
    storefront_engine::sqlite::run_migrations(db.pool()).await.expect("Migrations failed");
    db
}

pub fn uc_product() -> ProductSnapshot {
    ProductSnapshot {
        product_id: "uc-60".to_string(),
        name: "60 UC".to_string(),
        category: "PUBG Mobile".to_string(),
        unit_price: "4.00".parse().unwrap(),
        param_names: vec!["player_id".to_string()],
    }
}
