use storefront_engine::traits::{
    FulfillmentProvider,
    ProviderError,
    RemoteOutcome,
    StatusRecord,
    SubmitResponse,
};
use topup_tools::{OrderStatusRecord, RemoteOutcome as TopupOutcome, SubmitOutcome, TopupApi, TopupApiError};

/// [`FulfillmentProvider`] implementation backed by the real top-up provider's REST
/// API. The engine never sees the provider's envelope or vocabulary; everything is
/// mapped here.
#[derive(Clone)]
pub struct RemoteProvider {
    api: TopupApi,
}

impl RemoteProvider {
    pub fn new(api: TopupApi) -> Self {
        Self { api }
    }
}

impl FulfillmentProvider for RemoteProvider {
    async fn submit(
        &self,
        product_id: &str,
        quantity: u32,
        inputs: &[String],
        param_names: &[String],
        correlation_id: &str,
        account_id: i64,
    ) -> Result<SubmitResponse, ProviderError> {
        let outcome = self
            .api
            .submit_order(product_id, quantity, inputs, param_names, correlation_id, account_id)
            .await
            .map_err(map_error)?;
        let response = match outcome {
            SubmitOutcome::Accepted { provider_order_id } => SubmitResponse::Accepted { provider_order_id },
            SubmitOutcome::CapacityExhausted { code, reason } => SubmitResponse::CapacityExhausted { code, reason },
            SubmitOutcome::Rejected { code, reason } => SubmitResponse::Rejected { code, reason },
        };
        Ok(response)
    }

    async fn check_status(&self, correlation_ids: &[String]) -> Result<Vec<StatusRecord>, ProviderError> {
        let records = self.api.check_orders(correlation_ids).await.map_err(map_error)?;
        Ok(records.iter().map(map_record).collect())
    }
}

fn map_error(e: TopupApiError) -> ProviderError {
    match e {
        TopupApiError::Timeout(msg) => ProviderError::Timeout(msg),
        TopupApiError::RestResponseError(msg) => ProviderError::Network(msg),
        TopupApiError::QueryError { status, message } => {
            ProviderError::Network(format!("HTTP {status}: {message}"))
        },
        TopupApiError::JsonError(msg) | TopupApiError::Initialization(msg) => ProviderError::Response(msg),
    }
}

fn map_record(record: &OrderStatusRecord) -> StatusRecord {
    let outcome = match record.outcome() {
        TopupOutcome::Completed => RemoteOutcome::Completed,
        TopupOutcome::Rejected => RemoteOutcome::Rejected,
        TopupOutcome::InProgress => RemoteOutcome::InProgress,
    };
    StatusRecord {
        correlation_id: record.correlation_id(),
        provider_order_id: record.provider_order_id(),
        outcome,
        product_name: record.product_name.clone(),
        fulfillment_codes: record.replay_api.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timeouts_stay_timeouts() {
        assert!(matches!(map_error(TopupApiError::Timeout("t".into())), ProviderError::Timeout(_)));
        assert!(matches!(map_error(TopupApiError::RestResponseError("n".into())), ProviderError::Network(_)));
        assert!(matches!(
            map_error(TopupApiError::QueryError { status: 500, message: "boom".into() }),
            ProviderError::Network(_)
        ));
    }

    #[test]
    fn status_records_map_across_vocabularies() {
        let raw: OrderStatusRecord = serde_json::from_value(serde_json::json!({
            "order_uuid": "abc",
            "order_id": 99,
            "status": "completed",
            "product_name": "60 UC",
            "replay_api": ["CODE-1", "CODE-2"],
        }))
        .unwrap();
        let record = map_record(&raw);
        assert_eq!(record.correlation_id.as_deref(), Some("abc"));
        assert_eq!(record.provider_order_id.as_deref(), Some("99"));
        assert_eq!(record.outcome, RemoteOutcome::Completed);
        assert_eq!(record.fulfillment_codes, vec!["CODE-1".to_string(), "CODE-2".to_string()]);
    }
}
