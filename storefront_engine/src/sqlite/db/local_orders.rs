use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LocalOrder, NewLocalOrder, OrderId, OrderStatusType},
    sqlite::db::is_unique_violation,
    traits::StorefrontError,
};

pub async fn insert(order: NewLocalOrder, conn: &mut SqliteConnection) -> Result<LocalOrder, StorefrontError> {
    let inputs = serde_json::to_string(&order.inputs)
        .map_err(|e| StorefrontError::Validation(format!("Unencodable order inputs: {e}")))?;
    let short_id = order.order_id.as_str().to_string();
    let order: LocalOrder = sqlx::query_as(
        r#"
            INSERT INTO local_orders (
                order_id,
                account_id,
                product_id,
                product_name,
                category,
                unit_price,
                quantity,
                inputs
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.account_id)
    .bind(order.product_id)
    .bind(order.product_name)
    .bind(order.category)
    .bind(order.unit_price.value())
    .bind(order.quantity)
    .bind(inputs)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { StorefrontError::DuplicateId(short_id) } else { e.into() })?;
    debug!("📝️ Local order {} saved with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<LocalOrder>, StorefrontError> {
    let order = sqlx::query_as("SELECT * FROM local_orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_pending(conn: &mut SqliteConnection) -> Result<Vec<LocalOrder>, StorefrontError> {
    let orders = sqlx::query_as("SELECT * FROM local_orders WHERE status = 'Pending' ORDER BY created_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_for_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LocalOrder>, StorefrontError> {
    let orders = sqlx::query_as("SELECT * FROM local_orders WHERE account_id = $1 ORDER BY created_at DESC")
        .bind(account_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Compare-and-swap a pending local order into a terminal status. Returns the number
/// of rows updated; zero means the order was already processed (admin double-click,
/// or a concurrent decision) and the caller must not apply any balance effect.
pub async fn mark_terminal(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<u64, StorefrontError> {
    debug_assert!(status.is_terminal());
    let result = sqlx::query(
        r#"UPDATE local_orders
           SET status = $1, updated_at = CURRENT_TIMESTAMP
           WHERE order_id = $2 AND status = 'Pending'"#,
    )
    .bind(status.to_string())
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
