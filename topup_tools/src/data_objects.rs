use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider reason code for "provider-side balance exhausted".
pub const CODE_PROVIDER_BALANCE: i64 = 100;
/// Provider reason code for "requested quantity unavailable".
pub const CODE_QTY_UNAVAILABLE: i64 = 105;

/// The envelope every provider endpoint responds with.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProviderResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Result of a single order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The provider accepted the order and assigned its own order id.
    Accepted { provider_order_id: String },
    /// The provider cannot take the order right now (balance or stock exhausted).
    /// The purchase should fall back to manual fulfillment.
    CapacityExhausted { code: i64, reason: String },
    /// Explicit business rejection. The purchase must be refunded.
    Rejected { code: i64, reason: String },
}

/// One entry from the batched `/check` status endpoint.
///
/// The provider is inconsistent about where it reports the correlation uuid: it may
/// appear at the top level as `order_uuid` or `custom_uuid`, or nested inside `data`.
/// [`OrderStatusRecord::correlation_id`] checks all of these.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderStatusRecord {
    #[serde(default)]
    pub order_uuid: Option<String>,
    #[serde(default)]
    pub custom_uuid: Option<String>,
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub replay_api: Option<Vec<String>>,
    #[serde(default)]
    pub data: Value,
}

impl OrderStatusRecord {
    /// The correlation uuid this record refers to, if the provider reported one.
    pub fn correlation_id(&self) -> Option<String> {
        self.order_uuid
            .clone()
            .or_else(|| self.custom_uuid.clone())
            .or_else(|| self.data.get("custom_uuid").and_then(Value::as_str).map(String::from))
            .or_else(|| self.data.get("order_uuid").and_then(Value::as_str).map(String::from))
    }

    /// The provider's own order id, normalised to a string.
    pub fn provider_order_id(&self) -> Option<String> {
        let normalise = |v: &Value| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        self.order_id.as_ref().and_then(normalise).or_else(|| self.id.as_ref().and_then(normalise))
    }

    pub fn outcome(&self) -> RemoteOutcome {
        RemoteOutcome::from_provider_status(&self.status)
    }

    /// The first delivered voucher code, if any.
    pub fn first_code(&self) -> Option<String> {
        self.replay_api.as_ref().and_then(|codes| codes.first().cloned())
    }
}

/// The provider's status vocabulary collapsed to the three states the engine cares
/// about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    Completed,
    Rejected,
    InProgress,
}

impl RemoteOutcome {
    pub fn from_provider_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "success" | "accept" => Self::Completed,
            "canceled" | "cancelled" | "fail" | "failed" | "refunded" | "rejected" | "reject" => Self::Rejected,
            _ => Self::InProgress,
        }
    }
}

/// A catalog entry as reported by `/products`. Prices may arrive in either the
/// `price` or `rate` field depending on the product type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderProduct {
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProviderProduct {
    pub fn unit_price(&self) -> f64 {
        self.price.or(self.rate).unwrap_or(0.0)
    }
}

/// The reseller account profile as reported by `/profile`. Only the balance is acted
/// on (operator alerting); the rest is informational.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_vocabulary_mapping() {
        assert_eq!(RemoteOutcome::from_provider_status("completed"), RemoteOutcome::Completed);
        assert_eq!(RemoteOutcome::from_provider_status("Success"), RemoteOutcome::Completed);
        assert_eq!(RemoteOutcome::from_provider_status("accept"), RemoteOutcome::Completed);
        assert_eq!(RemoteOutcome::from_provider_status("Canceled"), RemoteOutcome::Rejected);
        assert_eq!(RemoteOutcome::from_provider_status("Fail"), RemoteOutcome::Rejected);
        assert_eq!(RemoteOutcome::from_provider_status("reject"), RemoteOutcome::Rejected);
        assert_eq!(RemoteOutcome::from_provider_status("Processing"), RemoteOutcome::InProgress);
        assert_eq!(RemoteOutcome::from_provider_status("In progress"), RemoteOutcome::InProgress);
        assert_eq!(RemoteOutcome::from_provider_status(""), RemoteOutcome::InProgress);
    }

    #[test]
    fn correlation_id_is_found_wherever_the_provider_put_it() {
        let top_level: OrderStatusRecord =
            serde_json::from_value(serde_json::json!({"order_uuid": "abc", "status": "completed"})).unwrap();
        assert_eq!(top_level.correlation_id().as_deref(), Some("abc"));

        let custom: OrderStatusRecord =
            serde_json::from_value(serde_json::json!({"custom_uuid": "def", "status": "completed"})).unwrap();
        assert_eq!(custom.correlation_id().as_deref(), Some("def"));

        let nested: OrderStatusRecord =
            serde_json::from_value(serde_json::json!({"data": {"custom_uuid": "ghi"}, "status": "Fail"})).unwrap();
        assert_eq!(nested.correlation_id().as_deref(), Some("ghi"));

        let missing: OrderStatusRecord = serde_json::from_value(serde_json::json!({"status": "Fail"})).unwrap();
        assert_eq!(missing.correlation_id(), None);
    }

    #[test]
    fn provider_order_id_accepts_numbers_and_strings() {
        let rec: OrderStatusRecord =
            serde_json::from_value(serde_json::json!({"order_id": 1234, "status": "completed"})).unwrap();
        assert_eq!(rec.provider_order_id().as_deref(), Some("1234"));
        let rec: OrderStatusRecord =
            serde_json::from_value(serde_json::json!({"id": "A-99", "status": "completed"})).unwrap();
        assert_eq!(rec.provider_order_id().as_deref(), Some("A-99"));
    }
}
