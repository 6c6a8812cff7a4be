use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRemoteOrder, RemoteOrder},
    sqlite::db::is_unique_violation,
    traits::StorefrontError,
};

/// Reserves the tracking record for a submission attempt. Status starts at `Pending`
/// and the row is written before any network call goes out.
pub async fn insert(order: NewRemoteOrder, conn: &mut SqliteConnection) -> Result<RemoteOrder, StorefrontError> {
    let correlation_id = order.correlation_id.clone();
    let order: RemoteOrder = sqlx::query_as(
        r#"
            INSERT INTO remote_orders (
                correlation_id,
                account_id,
                product_id,
                product_name,
                charged_price
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.correlation_id)
    .bind(order.account_id)
    .bind(order.product_id)
    .bind(order.product_name)
    .bind(order.charged_price.value())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StorefrontError::DuplicateId(correlation_id)
        } else {
            e.into()
        }
    })?;
    debug!("📝️ Remote order [{}] reserved with id {}", order.correlation_id, order.id);
    Ok(order)
}

pub async fn fetch_by_correlation_id(
    correlation_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<RemoteOrder>, StorefrontError> {
    let order = sqlx::query_as("SELECT * FROM remote_orders WHERE correlation_id = $1")
        .bind(correlation_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_by_provider_id(
    provider_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<RemoteOrder>, StorefrontError> {
    let order = sqlx::query_as("SELECT * FROM remote_orders WHERE provider_order_id = $1")
        .bind(provider_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// All orders still awaiting a terminal outcome, oldest first, for the batched poll.
pub async fn fetch_pending(conn: &mut SqliteConnection) -> Result<Vec<RemoteOrder>, StorefrontError> {
    let orders = sqlx::query_as("SELECT * FROM remote_orders WHERE status = 'Pending' ORDER BY created_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_for_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<RemoteOrder>, StorefrontError> {
    let orders = sqlx::query_as("SELECT * FROM remote_orders WHERE account_id = $1 ORDER BY created_at DESC")
        .bind(account_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn set_provider_order_id(
    correlation_id: &str,
    provider_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    sqlx::query(
        "UPDATE remote_orders SET provider_order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE correlation_id = $2",
    )
    .bind(provider_order_id)
    .bind(correlation_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Compare-and-swap to `Completed`, storing the fulfillment code and latching the
/// notified flag in the same statement. Returns the number of rows updated: zero means
/// the order was no longer `Pending` and the caller must treat the transition as
/// already applied.
pub async fn complete_pending(
    correlation_id: &str,
    fulfillment_code: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<u64, StorefrontError> {
    let result = sqlx::query(
        r#"UPDATE remote_orders
           SET status = 'Completed', fulfillment_code = $1, notified = 1, updated_at = CURRENT_TIMESTAMP
           WHERE correlation_id = $2 AND status = 'Pending'"#,
    )
    .bind(fulfillment_code)
    .bind(correlation_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Compare-and-swap to `Rejected` with the notified flag latched. The refund credit is
/// issued by the caller inside the same transaction, and only when this returns 1.
pub async fn reject_pending(correlation_id: &str, conn: &mut SqliteConnection) -> Result<u64, StorefrontError> {
    let result = sqlx::query(
        r#"UPDATE remote_orders
           SET status = 'Rejected', notified = 1, updated_at = CURRENT_TIMESTAMP
           WHERE correlation_id = $1 AND status = 'Pending'"#,
    )
    .bind(correlation_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
