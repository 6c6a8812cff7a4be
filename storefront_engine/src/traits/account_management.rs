use crate::{
    db_types::{Account, DepositRequest, LocalOrder, OrderId, RemoteOrder},
    traits::StorefrontError,
};

/// Read-side queries over accounts, orders and deposit requests. Everything here is
/// side-effect free; mutations live on [`super::StorefrontDatabase`].
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    fn fetch_account(&self, account_id: i64) -> impl std::future::Future<Output = Result<Option<Account>, StorefrontError>> + Send;

    /// All remote orders still awaiting a terminal provider outcome, oldest first.
    fn fetch_pending_remote_orders(&self) -> impl std::future::Future<Output = Result<Vec<RemoteOrder>, StorefrontError>> + Send;

    fn fetch_remote_order_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RemoteOrder>, StorefrontError>> + Send;

    /// Secondary lookup by the provider-assigned order id.
    fn fetch_remote_order_by_provider_id(
        &self,
        provider_order_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RemoteOrder>, StorefrontError>> + Send;

    fn fetch_remote_orders_for_account(&self, account_id: i64) -> impl std::future::Future<Output = Result<Vec<RemoteOrder>, StorefrontError>> + Send;

    fn fetch_local_order(&self, order_id: &OrderId) -> impl std::future::Future<Output = Result<Option<LocalOrder>, StorefrontError>> + Send;

    fn fetch_pending_local_orders(&self) -> impl std::future::Future<Output = Result<Vec<LocalOrder>, StorefrontError>> + Send;

    fn fetch_local_orders_for_account(&self, account_id: i64) -> impl std::future::Future<Output = Result<Vec<LocalOrder>, StorefrontError>> + Send;

    fn fetch_deposit_request(&self, request_id: &OrderId) -> impl std::future::Future<Output = Result<Option<DepositRequest>, StorefrontError>> + Send;

    fn fetch_pending_deposit_requests(&self) -> impl std::future::Future<Output = Result<Vec<DepositRequest>, StorefrontError>> + Send;
}
