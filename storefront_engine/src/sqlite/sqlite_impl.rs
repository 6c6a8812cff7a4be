use log::{debug, info};
use sqlx::SqlitePool;

use crate::{
    db_types::{
        Account,
        DepositRequest,
        DepositStatusType,
        LocalOrder,
        Money,
        NewDepositRequest,
        NewLocalOrder,
        NewRemoteOrder,
        OrderId,
        OrderStatusType,
        RemoteOrder,
    },
    sqlite::db,
    traits::{AccountManagement, StorefrontDatabase, StorefrontError},
};

/// The SQLite backend for the storefront engine.
///
/// Cloning is cheap (the connection pool is reference-counted), so a single instance
/// can be shared between the order flow, the reconciliation worker and the front-end.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Creates a new database instance, reading the URL from `SFB_DATABASE_URL` or
    /// falling back to the default location.
    pub async fn new(max_connections: u32) -> Result<Self, StorefrontError> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StorefrontError> {
        let pool = db::new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::fetch_account(account_id, &mut conn).await
    }

    async fn fetch_pending_remote_orders(&self) -> Result<Vec<RemoteOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::remote_orders::fetch_pending(&mut conn).await
    }

    async fn fetch_remote_order_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<RemoteOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::remote_orders::fetch_by_correlation_id(correlation_id, &mut conn).await
    }

    async fn fetch_remote_order_by_provider_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<RemoteOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::remote_orders::fetch_by_provider_id(provider_order_id, &mut conn).await
    }

    async fn fetch_remote_orders_for_account(&self, account_id: i64) -> Result<Vec<RemoteOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::remote_orders::fetch_for_account(account_id, &mut conn).await
    }

    async fn fetch_local_order(&self, order_id: &OrderId) -> Result<Option<LocalOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::local_orders::fetch_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_pending_local_orders(&self) -> Result<Vec<LocalOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::local_orders::fetch_pending(&mut conn).await
    }

    async fn fetch_local_orders_for_account(&self, account_id: i64) -> Result<Vec<LocalOrder>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::local_orders::fetch_for_account(account_id, &mut conn).await
    }

    async fn fetch_deposit_request(&self, request_id: &OrderId) -> Result<Option<DepositRequest>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::deposits::fetch_by_request_id(request_id, &mut conn).await
    }

    async fn fetch_pending_deposit_requests(&self) -> Result<Vec<DepositRequest>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::deposits::fetch_pending(&mut conn).await
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_or_create_account(&self, account_id: i64) -> Result<Account, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::fetch_or_create_account(account_id, &mut conn).await
    }

    async fn debit_balance(&self, account_id: i64, amount: Money) -> Result<Option<Money>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::debit(account_id, amount, &mut conn).await
    }

    async fn credit_balance(
        &self,
        account_id: i64,
        amount: Money,
        as_deposit: bool,
    ) -> Result<Money, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::credit(account_id, amount, as_deposit, &mut conn).await
    }

    async fn set_banned(&self, account_id: i64, banned: bool) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::set_banned(account_id, banned, &mut conn).await
    }

    async fn set_admin(&self, account_id: i64, is_admin: bool) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::accounts::set_admin(account_id, is_admin, &mut conn).await
    }

    async fn charge_and_reserve(&self, order: NewRemoteOrder) -> Result<bool, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        if db::accounts::debit(order.account_id, order.charged_price, &mut tx).await?.is_none() {
            return Ok(false);
        }
        let order = db::remote_orders::insert(order, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "📬️ Charged {} to account #{} and reserved submission [{}]",
            order.charged_price, order.account_id, order.correlation_id
        );
        Ok(true)
    }

    async fn attach_provider_order_id(
        &self,
        correlation_id: &str,
        provider_order_id: &str,
    ) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::remote_orders::set_provider_order_id(correlation_id, provider_order_id, &mut conn).await
    }

    async fn finalize_rejected_submission(
        &self,
        correlation_id: &str,
        refund: bool,
    ) -> Result<Option<Money>, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let order = db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::RemoteOrderNotFound(correlation_id.to_string()))?;
        let won = db::remote_orders::reject_pending(correlation_id, &mut tx).await? == 1;
        let new_balance = match (won, refund) {
            (true, true) => {
                Some(db::accounts::credit(order.account_id, order.charged_price, false, &mut tx).await?)
            },
            _ => None,
        };
        tx.commit().await?;
        if won {
            info!(
                "📬️ Submission [{correlation_id}] finalized as rejected. Refund applied: {}",
                new_balance.is_some()
            );
        }
        Ok(new_balance)
    }

    async fn convert_submission_to_local(
        &self,
        correlation_id: &str,
        order: NewLocalOrder,
    ) -> Result<LocalOrder, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let remote = db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::RemoteOrderNotFound(correlation_id.to_string()))?;
        let won = db::remote_orders::reject_pending(correlation_id, &mut tx).await? == 1;
        if !won {
            return Err(StorefrontError::AlreadyProcessed {
                id: OrderId::from(correlation_id),
                status: remote.status,
            });
        }
        let local = db::local_orders::insert(order, &mut tx).await?;
        tx.commit().await?;
        info!("📬️ Submission [{correlation_id}] converted to local order {}", local.order_id);
        Ok(local)
    }

    async fn complete_remote_order(
        &self,
        correlation_id: &str,
        fulfillment_code: Option<String>,
    ) -> Result<Option<RemoteOrder>, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::RemoteOrderNotFound(correlation_id.to_string()))?;
        let won = db::remote_orders::complete_pending(correlation_id, fulfillment_code.as_deref(), &mut tx).await? == 1;
        let order = match won {
            true => db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx).await?,
            false => None,
        };
        tx.commit().await?;
        match &order {
            Some(o) => info!("📬️ Remote order [{correlation_id}] completed for account #{}", o.account_id),
            None => debug!("📬️ Remote order [{correlation_id}] was already resolved. Nothing to do."),
        }
        Ok(order)
    }

    async fn reject_remote_order_with_refund(
        &self,
        correlation_id: &str,
    ) -> Result<Option<(RemoteOrder, Money)>, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let order = db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::RemoteOrderNotFound(correlation_id.to_string()))?;
        let won = db::remote_orders::reject_pending(correlation_id, &mut tx).await? == 1;
        if !won {
            tx.commit().await?;
            debug!("📬️ Remote order [{correlation_id}] was already resolved. No refund issued.");
            return Ok(None);
        }
        let new_balance = db::accounts::credit(order.account_id, order.charged_price, false, &mut tx).await?;
        let order = db::remote_orders::fetch_by_correlation_id(correlation_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::RemoteOrderNotFound(correlation_id.to_string()))?;
        tx.commit().await?;
        info!(
            "📬️ Remote order [{correlation_id}] rejected. {} refunded to account #{}",
            order.charged_price, order.account_id
        );
        Ok(Some((order, new_balance)))
    }

    async fn complete_local_order(&self, order_id: &OrderId) -> Result<LocalOrder, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let order = db::local_orders::fetch_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_id.clone()))?;
        let won = db::local_orders::mark_terminal(order_id, OrderStatusType::Completed, &mut tx).await? == 1;
        if !won {
            return Err(StorefrontError::AlreadyProcessed { id: order_id.clone(), status: order.status });
        }
        let order = db::local_orders::fetch_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        info!("📋️ Local order {order_id} marked as completed");
        Ok(order)
    }

    async fn refund_local_order(&self, order_id: &OrderId) -> Result<(LocalOrder, Money, Money), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let order = db::local_orders::fetch_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_id.clone()))?;
        let won = db::local_orders::mark_terminal(order_id, OrderStatusType::Rejected, &mut tx).await? == 1;
        if !won {
            return Err(StorefrontError::AlreadyProcessed { id: order_id.clone(), status: order.status });
        }
        let refund = order.total_price();
        let new_balance = db::accounts::credit(order.account_id, refund, false, &mut tx).await?;
        let order = db::local_orders::fetch_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        info!("📋️ Local order {order_id} rejected. {refund} refunded to account #{}", order.account_id);
        Ok((order, refund, new_balance))
    }

    async fn insert_deposit_request(&self, request: NewDepositRequest) -> Result<DepositRequest, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::deposits::insert(request, &mut conn).await
    }

    async fn approve_deposit(
        &self,
        request_id: &OrderId,
        net_credit: Money,
    ) -> Result<(DepositRequest, Money), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let request = db::deposits::fetch_by_request_id(request_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::DepositNotFound(request_id.clone()))?;
        let won = db::deposits::mark_decided(request_id, DepositStatusType::Approved, &mut tx).await? == 1;
        if !won {
            return Err(StorefrontError::DepositAlreadyProcessed(request_id.clone()));
        }
        let new_balance = db::accounts::credit(request.account_id, net_credit, true, &mut tx).await?;
        let request = db::deposits::fetch_by_request_id(request_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::DepositNotFound(request_id.clone()))?;
        tx.commit().await?;
        info!("🏦️ Deposit {request_id} approved. {net_credit} credited to account #{}", request.account_id);
        Ok((request, new_balance))
    }

    async fn reject_deposit(&self, request_id: &OrderId) -> Result<DepositRequest, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        db::deposits::fetch_by_request_id(request_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::DepositNotFound(request_id.clone()))?;
        let won = db::deposits::mark_decided(request_id, DepositStatusType::Rejected, &mut tx).await? == 1;
        if !won {
            return Err(StorefrontError::DepositAlreadyProcessed(request_id.clone()));
        }
        let request = db::deposits::fetch_by_request_id(request_id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontError::DepositNotFound(request_id.clone()))?;
        tx.commit().await?;
        info!("🏦️ Deposit {request_id} rejected for account #{}", request.account_id);
        Ok(request)
    }

    async fn fetch_setting(&self, name: &str) -> Result<Option<String>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::settings::fetch_setting(name, &mut conn).await
    }

    async fn set_setting(&self, name: &str, value: &str) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        db::settings::set_setting(name, value, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), StorefrontError> {
        self.pool.close().await;
        Ok(())
    }
}
