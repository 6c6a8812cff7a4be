use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::TopupConfig,
    data_objects::{OrderStatusRecord, ProviderProduct, ProviderProfile, ProviderResponse, SubmitOutcome},
    TopupApiError,
    CODE_PROVIDER_BALANCE,
    CODE_QTY_UNAVAILABLE,
};

#[derive(Clone)]
pub struct TopupApi {
    config: TopupConfig,
    client: Arc<Client>,
}

impl TopupApi {
    pub fn new(config: TopupConfig) -> Result<Self, TopupApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_token.reveal().as_str())
            .map_err(|e| TopupApiError::Initialization(e.to_string()))?;
        headers.insert("api-token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TopupApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, TopupApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TopupApiError::Timeout(e.to_string())
            } else {
                TopupApiError::RestResponseError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| TopupApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| TopupApiError::RestResponseError(e.to_string()))?;
            Err(TopupApiError::QueryError { status, message })
        }
    }

    /// Submits a new order to the provider.
    ///
    /// The caller supplies its own correlation uuid; it is sent both as `order_uuid`
    /// and `custom_uuid` since the provider echoes back whichever it feels like.
    /// The first collected input is the provider's `playerId`; any further inputs are
    /// sent under the parameter names the product declared.
    ///
    /// A timeout surfaces as [`TopupApiError::Timeout`], which the caller must treat
    /// as an unknown outcome rather than a rejection.
    pub async fn submit_order(
        &self,
        product_id: &str,
        quantity: u32,
        inputs: &[String],
        param_names: &[String],
        correlation_id: &str,
        account_id: i64,
    ) -> Result<SubmitOutcome, TopupApiError> {
        let path = format!("/newOrder/{product_id}/params");
        let main_input = inputs.first().cloned().unwrap_or_default();
        let mut params = vec![
            ("qty", quantity.to_string()),
            ("playerId", main_input),
            ("order_uuid", correlation_id.to_string()),
            ("custom_uuid", correlation_id.to_string()),
            ("telegram_id", account_id.to_string()),
        ];
        for (name, value) in param_names.iter().zip(inputs).skip(1) {
            params.push((name.as_str(), value.clone()));
        }
        debug!("🚀 Submitting order {correlation_id} for product {product_id} (qty {quantity})");
        let res: ProviderResponse = self.rest_query(Method::POST, &path, &params).await?;
        if res.is_ok() {
            let provider_order_id = res
                .data
                .get("order_id")
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            info!("🚀 Order {correlation_id} accepted by provider as [{provider_order_id}]");
            return Ok(SubmitOutcome::Accepted { provider_order_id });
        }
        let code = res.code.unwrap_or(0);
        let reason = res.message.unwrap_or_else(|| "Submission failed".to_string());
        let outcome = if code == CODE_PROVIDER_BALANCE || code == CODE_QTY_UNAVAILABLE {
            info!("🚀 Provider capacity exhausted for {correlation_id} (code {code}): {reason}");
            SubmitOutcome::CapacityExhausted { code, reason }
        } else {
            info!("🚀 Order {correlation_id} rejected by provider (code {code}): {reason}");
            SubmitOutcome::Rejected { code, reason }
        };
        Ok(outcome)
    }

    /// Batched status poll for a set of correlation uuids (and/or provider order ids).
    pub async fn check_orders(&self, ids: &[String]) -> Result<Vec<OrderStatusRecord>, TopupApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let orders_param =
            serde_json::to_string(ids).map_err(|e| TopupApiError::JsonError(e.to_string()))?;
        let params = vec![("orders", orders_param), ("uuid", "1".to_string())];
        let res: ProviderResponse = self.rest_query(Method::GET, "/check", &params).await?;
        if !res.is_ok() {
            return Err(TopupApiError::RestResponseError(format!(
                "status check returned status {}",
                res.status
            )));
        }
        let records: Vec<OrderStatusRecord> =
            serde_json::from_value(res.data).map_err(|e| TopupApiError::JsonError(e.to_string()))?;
        debug!("🔍 Status check returned {} records for {} queried ids", records.len(), ids.len());
        Ok(records)
    }

    /// Fetches the full provider catalog. Used by the scheduled catalog refresh job.
    pub async fn fetch_products(&self) -> Result<Vec<ProviderProduct>, TopupApiError> {
        let products: Vec<ProviderProduct> = self.rest_query(Method::GET, "/products", &[]).await?;
        info!("🛒 Fetched {} products from provider", products.len());
        Ok(products)
    }

    /// Fetches the reseller account profile, including the remaining provider-side
    /// balance.
    pub async fn fetch_profile(&self) -> Result<ProviderProfile, TopupApiError> {
        let profile: ProviderProfile = self.rest_query(Method::GET, "/profile", &[]).await?;
        Ok(profile)
    }
}
