use thiserror::Error;

/// The engine's view of the external fulfillment provider.
///
/// Implementations wrap the provider's HTTP API; tests substitute a scripted mock.
/// Both calls run under a bounded timeout. A timeout during `submit` must surface as
/// [`ProviderError::Timeout`] — the gateway treats it as an *unknown* outcome and
/// keeps the pending reservation for the reconciliation loop to resolve, rather than
/// refunding.
#[allow(async_fn_in_trait)]
pub trait FulfillmentProvider: Clone {
    /// Submits a purchase. `correlation_id` is the locally generated token the
    /// provider is asked to echo back in status reports.
    fn submit(
        &self,
        product_id: &str,
        quantity: u32,
        inputs: &[String],
        param_names: &[String],
        correlation_id: &str,
        account_id: i64,
    ) -> impl std::future::Future<Output = Result<SubmitResponse, ProviderError>> + Send;

    /// One batched status query for the given correlation ids.
    fn check_status(&self, correlation_ids: &[String]) -> impl std::future::Future<Output = Result<Vec<StatusRecord>, ProviderError>> + Send;
}

/// Immediate outcome of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResponse {
    /// Accepted; the provider assigned its own order id.
    Accepted { provider_order_id: String },
    /// The provider path is exhausted (provider balance or stock). The purchase
    /// falls back to manual fulfillment.
    CapacityExhausted { code: i64, reason: String },
    /// Explicit business rejection; the debit must be refunded.
    Rejected { code: i64, reason: String },
}

/// One provider-reported outcome from a batched status poll, already mapped from the
/// provider's vocabulary to the engine's.
#[derive(Debug, Clone, Default)]
pub struct StatusRecord {
    pub correlation_id: Option<String>,
    pub provider_order_id: Option<String>,
    pub outcome: RemoteOutcome,
    pub product_name: Option<String>,
    /// Voucher/secret codes delivered on completion, first one wins.
    pub fulfillment_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemoteOutcome {
    Completed,
    Rejected,
    #[default]
    InProgress,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider call timed out: {0}")]
    Timeout(String),
    #[error("Provider network error: {0}")]
    Network(String),
    #[error("Unexpected provider response: {0}")]
    Response(String),
}
