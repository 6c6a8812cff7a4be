use thiserror::Error;

use crate::{
    db_types::{
        DepositRequest,
        LocalOrder,
        Money,
        NewDepositRequest,
        NewLocalOrder,
        NewRemoteOrder,
        OrderId,
        OrderStatusType,
        RemoteOrder,
    },
    traits::{AccountManagement, ProviderError},
};

/// This trait defines the highest level of behaviour for backends supporting the
/// storefront engine.
///
/// The contract that matters most: every method that pairs a terminal status write
/// with a balance mutation performs both in a single atomic transaction, with the
/// status write guarded by a compare-and-swap on the current `Pending` status. A
/// caller that loses the race gets `None` (or an `AlreadyProcessed` error for the
/// admin-facing methods) and must not apply any balance effect of its own.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the account with the given id, creating an empty one if none exists.
    fn fetch_or_create_account(&self, account_id: i64) -> impl std::future::Future<Output = Result<crate::db_types::Account, StorefrontError>> + Send;

    /// Attempts to debit the account. Returns the new balance, or `None` (not an
    /// error) when the balance is insufficient. The check and the subtraction are a
    /// single serialized read-modify-write; concurrent debits cannot overdraw the
    /// account.
    fn debit_balance(&self, account_id: i64, amount: Money) -> impl std::future::Future<Output = Result<Option<Money>, StorefrontError>> + Send;

    /// Credits the account and returns the new balance. When `as_deposit` is true the
    /// lifetime deposit counter is bumped by the same amount.
    fn credit_balance(&self, account_id: i64, amount: Money, as_deposit: bool) -> impl std::future::Future<Output = Result<Money, StorefrontError>> + Send;

    /// Sets or clears the banned flag.
    fn set_banned(&self, account_id: i64, banned: bool) -> impl std::future::Future<Output = Result<(), StorefrontError>> + Send;

    /// Sets or clears the administrative-role flag.
    fn set_admin(&self, account_id: i64, is_admin: bool) -> impl std::future::Future<Output = Result<(), StorefrontError>> + Send;

    /// Debits the charged price and reserves the tracking record (status `Pending`)
    /// in a single transaction, called *before* the submission network call. Either
    /// both apply or neither does: a storage failure on the reservation insert rolls
    /// the debit back, so a charge can never exist without a record tracking it.
    /// Returns `false` (nothing applied) when the balance is insufficient.
    fn charge_and_reserve(&self, order: NewRemoteOrder) -> impl std::future::Future<Output = Result<bool, StorefrontError>> + Send;

    /// Records the provider's own order id against an accepted reservation.
    fn attach_provider_order_id(
        &self,
        correlation_id: &str,
        provider_order_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StorefrontError>> + Send;

    /// Finalizes a reservation after an explicit provider rejection: compare-and-swap
    /// the order from `Pending` to `Rejected` with `notified = true`, and, if `refund`
    /// is set and the swap won, credit the charged price back — all in one
    /// transaction. Returns the new balance when a refund was applied.
    fn finalize_rejected_submission(
        &self,
        correlation_id: &str,
        refund: bool,
    ) -> impl std::future::Future<Output = Result<Option<Money>, StorefrontError>> + Send;

    /// Converts a reservation into a manually fulfilled local order after the provider
    /// signalled capacity exhaustion. In one transaction: CAS the reservation to
    /// `Rejected`/`notified` (no refund — the debit moves to the local order) and
    /// insert the local order with status `Pending`.
    fn convert_submission_to_local(
        &self,
        correlation_id: &str,
        order: NewLocalOrder,
    ) -> impl std::future::Future<Output = Result<LocalOrder, StorefrontError>> + Send;

    /// Reconciliation transition to `Completed`: compare-and-swap from `Pending`,
    /// storing the fulfillment code and latching `notified = true`. Returns the
    /// updated order, or `None` if the order was no longer pending (a previous pass or
    /// an admin already resolved it).
    fn complete_remote_order(
        &self,
        correlation_id: &str,
        fulfillment_code: Option<String>,
    ) -> impl std::future::Future<Output = Result<Option<RemoteOrder>, StorefrontError>> + Send;

    /// Reconciliation transition to `Rejected` with refund. In one transaction: CAS
    /// from `Pending` to `Rejected`/`notified`, and only if the swap won, credit the
    /// charged price. The latch-then-refund order inside the transaction is what makes
    /// a re-entered pass unable to refund twice. Returns the updated order and the new
    /// balance, or `None` if the order was already terminal.
    fn reject_remote_order_with_refund(
        &self,
        correlation_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<(RemoteOrder, Money)>, StorefrontError>> + Send;

    /// Admin terminal action: mark a pending local order completed. No ledger effect.
    /// Fails with [`StorefrontError::AlreadyProcessed`] if the order is not pending.
    fn complete_local_order(&self, order_id: &OrderId) -> impl std::future::Future<Output = Result<LocalOrder, StorefrontError>> + Send;

    /// Admin terminal action: reject a pending local order and refund quantity × unit
    /// price, atomically. Returns the updated order, the refunded amount and the new
    /// balance. Fails with [`StorefrontError::AlreadyProcessed`] if the order is not
    /// pending.
    fn refund_local_order(&self, order_id: &OrderId) -> impl std::future::Future<Output = Result<(LocalOrder, Money, Money), StorefrontError>> + Send;

    /// Stores a new deposit request with status `Pending`.
    fn insert_deposit_request(&self, request: NewDepositRequest) -> impl std::future::Future<Output = Result<DepositRequest, StorefrontError>> + Send;

    /// Approves a pending deposit request, crediting `net_credit` (already converted
    /// and net of commission) with `as_deposit = true` in the same transaction as the
    /// status change. Returns the updated request and the new balance.
    fn approve_deposit(
        &self,
        request_id: &OrderId,
        net_credit: Money,
    ) -> impl std::future::Future<Output = Result<(DepositRequest, Money), StorefrontError>> + Send;

    /// Rejects a pending deposit request. No ledger effect.
    fn reject_deposit(&self, request_id: &OrderId) -> impl std::future::Future<Output = Result<DepositRequest, StorefrontError>> + Send;

    /// Fetches a raw setting value from the key-value settings store.
    fn fetch_setting(&self, name: &str) -> impl std::future::Future<Output = Result<Option<String>, StorefrontError>> + Send;

    /// Inserts or replaces a setting value.
    fn set_setting(&self, name: &str, value: &str) -> impl std::future::Future<Output = Result<(), StorefrontError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), StorefrontError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Insufficient funds: need {needed}, balance is {balance}")]
    InsufficientFunds { needed: Money, balance: Money },
    #[error("The requested account {0} does not exist")]
    AccountNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("No remote order is tracked under correlation id {0}")]
    RemoteOrderNotFound(String),
    #[error("The requested deposit request {0} does not exist")]
    DepositNotFound(OrderId),
    #[error("Order {id} was already processed (status is {status})")]
    AlreadyProcessed { id: OrderId, status: OrderStatusType },
    #[error("Deposit request {0} was already processed")]
    DepositAlreadyProcessed(OrderId),
    #[error("A record with id {0} already exists")]
    DuplicateId(String),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("The provider rejected the order (code {code}): {reason}")]
    ProviderRejected { code: i64, reason: String },
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontError::DatabaseError(e.to_string())
    }
}
