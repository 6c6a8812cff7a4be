pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;

/// Applies any outstanding schema migrations. The migration files are embedded in the
/// binary at compile time.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./src/sqlite/migrations").run(pool).await
}
