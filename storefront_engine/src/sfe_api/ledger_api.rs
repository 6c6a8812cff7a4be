use log::info;

use crate::{
    db_types::{Account, DepositRequest, LocalOrder, Money, RemoteOrder},
    traits::{StorefrontDatabase, StorefrontError},
};

/// Direct access to the wallet ledger and account flags. Every balance mutation in the
/// system funnels through the backend's guarded single-statement updates; this API just
/// adds the administrative entry points and the read-side queries.
#[derive(Debug, Clone)]
pub struct LedgerApi<B> {
    db: B,
}

impl<B> LedgerApi<B>
where B: StorefrontDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_or_create_account(&self, account_id: i64) -> Result<Account, StorefrontError> {
        self.db.fetch_or_create_account(account_id).await
    }

    pub async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, StorefrontError> {
        self.db.fetch_account(account_id).await
    }

    pub async fn balance(&self, account_id: i64) -> Result<Money, StorefrontError> {
        let account = self.db.fetch_or_create_account(account_id).await?;
        Ok(account.balance)
    }

    /// Administrative balance adjustment (credit). Returns the new balance.
    pub async fn adjust_credit(&self, account_id: i64, amount: Money) -> Result<Money, StorefrontError> {
        self.db.fetch_or_create_account(account_id).await?;
        let new_balance = self.db.credit_balance(account_id, amount, false).await?;
        info!("🏦️ Adjustment: credited {amount} to account #{account_id}. New balance: {new_balance}");
        Ok(new_balance)
    }

    /// Administrative balance adjustment (debit). Fails with
    /// [`StorefrontError::InsufficientFunds`] rather than letting the balance go
    /// negative.
    pub async fn adjust_debit(&self, account_id: i64, amount: Money) -> Result<Money, StorefrontError> {
        // The guarded update hands back the new balance itself, so success needs no
        // second read. The balance in the error is read after the failed attempt.
        let Some(new_balance) = self.db.debit_balance(account_id, amount).await? else {
            let balance = self.db.fetch_or_create_account(account_id).await?.balance;
            return Err(StorefrontError::InsufficientFunds { needed: amount, balance });
        };
        info!("🏦️ Adjustment: debited {amount} from account #{account_id}. New balance: {new_balance}");
        Ok(new_balance)
    }

    pub async fn set_banned(&self, account_id: i64, banned: bool) -> Result<(), StorefrontError> {
        self.db.fetch_or_create_account(account_id).await?;
        self.db.set_banned(account_id, banned).await?;
        info!("🏦️ Account #{account_id} banned flag set to {banned}");
        Ok(())
    }

    pub async fn set_admin(&self, account_id: i64, is_admin: bool) -> Result<(), StorefrontError> {
        self.db.fetch_or_create_account(account_id).await?;
        self.db.set_admin(account_id, is_admin).await?;
        info!("🏦️ Account #{account_id} admin flag set to {is_admin}");
        Ok(())
    }

    pub async fn remote_order_history(&self, account_id: i64) -> Result<Vec<RemoteOrder>, StorefrontError> {
        self.db.fetch_remote_orders_for_account(account_id).await
    }

    pub async fn local_order_history(&self, account_id: i64) -> Result<Vec<LocalOrder>, StorefrontError> {
        self.db.fetch_local_orders_for_account(account_id).await
    }

    pub async fn pending_deposit_requests(&self) -> Result<Vec<DepositRequest>, StorefrontError> {
        self.db.fetch_pending_deposit_requests().await
    }
}
