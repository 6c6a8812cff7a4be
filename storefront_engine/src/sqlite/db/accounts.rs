use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Account, Money},
    traits::StorefrontError,
};

pub async fn fetch_account(account_id: i64, conn: &mut SqliteConnection) -> Result<Option<Account>, StorefrontError> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

/// Fetches the account, creating an empty one first if none exists.
pub async fn fetch_or_create_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Account, StorefrontError> {
    sqlx::query("INSERT OR IGNORE INTO accounts (id) VALUES ($1)").bind(account_id).execute(&mut *conn).await?;
    let account = fetch_account(account_id, conn)
        .await?
        .ok_or(StorefrontError::AccountNotFound(account_id))?;
    Ok(account)
}

/// Attempts to debit the account in a single guarded statement. The balance check and
/// subtraction are one atomic read-modify-write in the storage engine, so concurrent
/// debits serialize and can never overdraw.
///
/// Returns the new balance, or `None` when the balance was insufficient.
pub async fn debit(
    account_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, StorefrontError> {
    if amount.is_negative() {
        return Err(StorefrontError::Validation(format!("Cannot debit a negative amount ({amount})")));
    }
    let new_balance: Option<i64> = sqlx::query_scalar(
        r#"UPDATE accounts
           SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
           WHERE id = $2 AND balance >= $1
           RETURNING balance"#,
    )
    .bind(amount.value())
    .bind(account_id)
    .fetch_optional(conn)
    .await?;
    match new_balance {
        Some(balance) => trace!("🏦️ Debited {amount} from account #{account_id}. New balance: {balance}"),
        None => trace!("🏦️ Debit of {amount} from account #{account_id}: insufficient funds"),
    }
    Ok(new_balance.map(Money::from))
}

/// Credits the account and returns the new balance. With `as_deposit` the lifetime
/// deposit counter is bumped by the same amount (statistics only, not spendable).
pub async fn credit(
    account_id: i64,
    amount: Money,
    as_deposit: bool,
    conn: &mut SqliteConnection,
) -> Result<Money, StorefrontError> {
    if amount.is_negative() {
        return Err(StorefrontError::Validation(format!("Cannot credit a negative amount ({amount})")));
    }
    let new_balance: i64 = sqlx::query_scalar(
        r#"UPDATE accounts
           SET balance = balance + $1,
               total_deposited = total_deposited + CASE WHEN $2 THEN $1 ELSE 0 END,
               updated_at = CURRENT_TIMESTAMP
           WHERE id = $3
           RETURNING balance"#,
    )
    .bind(amount.value())
    .bind(as_deposit)
    .bind(account_id)
    .fetch_optional(conn)
    .await?
    .ok_or(StorefrontError::AccountNotFound(account_id))?;
    debug!("🏦️ Credited {amount} to account #{account_id} (deposit: {as_deposit}). New balance: {new_balance}");
    Ok(Money::from(new_balance))
}

pub async fn set_banned(account_id: i64, banned: bool, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    sqlx::query("UPDATE accounts SET banned = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(banned)
        .bind(account_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_admin(account_id: i64, is_admin: bool, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    sqlx::query("UPDATE accounts SET is_admin = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(is_admin)
        .bind(account_id)
        .execute(conn)
        .await?;
    Ok(())
}
