use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DepositRequest, DepositStatusType, NewDepositRequest, OrderId},
    sqlite::db::is_unique_violation,
    traits::StorefrontError,
};

pub async fn insert(
    request: NewDepositRequest,
    conn: &mut SqliteConnection,
) -> Result<DepositRequest, StorefrontError> {
    let short_id = request.request_id.as_str().to_string();
    let request: DepositRequest = sqlx::query_as(
        r#"
            INSERT INTO deposit_requests (
                request_id,
                account_id,
                method,
                txn_reference,
                amount,
                proof_ref
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(request.request_id)
    .bind(request.account_id)
    .bind(request.method)
    .bind(request.txn_reference)
    .bind(request.amount.value())
    .bind(request.proof_ref)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { StorefrontError::DuplicateId(short_id) } else { e.into() })?;
    debug!("📝️ Deposit request {} saved for account #{}", request.request_id, request.account_id);
    Ok(request)
}

pub async fn fetch_by_request_id(
    request_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<DepositRequest>, StorefrontError> {
    let request = sqlx::query_as("SELECT * FROM deposit_requests WHERE request_id = $1")
        .bind(request_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(request)
}

pub async fn fetch_pending(conn: &mut SqliteConnection) -> Result<Vec<DepositRequest>, StorefrontError> {
    let requests = sqlx::query_as("SELECT * FROM deposit_requests WHERE status = 'Pending' ORDER BY created_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(requests)
}

/// Compare-and-swap a pending request into a terminal status. Zero rows updated means
/// the request was already decided; the caller must not credit anything.
pub async fn mark_decided(
    request_id: &OrderId,
    status: DepositStatusType,
    conn: &mut SqliteConnection,
) -> Result<u64, StorefrontError> {
    let result = sqlx::query(
        r#"UPDATE deposit_requests
           SET status = $1, updated_at = CURRENT_TIMESTAMP
           WHERE request_id = $2 AND status = 'Pending'"#,
    )
    .bind(status.to_string())
    .bind(request_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
