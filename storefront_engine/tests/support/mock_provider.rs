use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use storefront_engine::traits::{FulfillmentProvider, ProviderError, StatusRecord, SubmitResponse};

/// A scripted stand-in for the real top-up provider. Submission responses are popped
/// from a queue (defaulting to acceptance); status reports are whatever the test
/// loaded last.
#[derive(Clone, Default)]
pub struct MockProvider {
    submit_script: Arc<Mutex<VecDeque<Result<SubmitResponse, ProviderError>>>>,
    status_records: Arc<Mutex<Vec<StatusRecord>>>,
    submissions: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn script_submit(&self, response: Result<SubmitResponse, ProviderError>) {
        self.submit_script.lock().unwrap().push_back(response);
    }

    pub fn set_status_records(&self, records: Vec<StatusRecord>) {
        *self.status_records.lock().unwrap() = records;
    }

    /// Correlation ids of every submission the provider has seen, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }
}

impl FulfillmentProvider for MockProvider {
    async fn submit(
        &self,
        _product_id: &str,
        _quantity: u32,
        _inputs: &[String],
        _param_names: &[String],
        correlation_id: &str,
        _account_id: i64,
    ) -> Result<SubmitResponse, ProviderError> {
        self.submissions.lock().unwrap().push(correlation_id.to_string());
        self.submit_script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SubmitResponse::Accepted { provider_order_id: format!("prov-{correlation_id}") })
        })
    }

    async fn check_status(&self, _correlation_ids: &[String]) -> Result<Vec<StatusRecord>, ProviderError> {
        Ok(self.status_records.lock().unwrap().clone())
    }
}
