use sqlx::SqliteConnection;

use crate::traits::StorefrontError;

pub async fn fetch_setting(name: &str, conn: &mut SqliteConnection) -> Result<Option<String>, StorefrontError> {
    let value = sqlx::query_scalar("SELECT value FROM settings WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(value)
}

pub async fn set_setting(name: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    sqlx::query(
        r#"INSERT INTO settings (name, value) VALUES ($1, $2)
           ON CONFLICT (name) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP"#,
    )
    .bind(name)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
