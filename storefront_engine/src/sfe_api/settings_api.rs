use log::warn;

use crate::{
    helpers::markup::MarkupRules,
    traits::{StorefrontDatabase, StorefrontError},
};

pub const EXCHANGE_RATE_KEY: &str = "exchange_rate";
pub const DEPOSIT_COMMISSION_KEY: &str = "deposit_commission_pct";
pub const MARKUP_RULES_KEY: &str = "markup_rules";

/// Units of deposit currency per unit of spendable currency, used when no rate has
/// been configured yet.
pub const DEFAULT_EXCHANGE_RATE: f64 = 15_000.0;

/// Typed access to the runtime settings store. Values live in a key-value table so
/// that admins can change them without a restart; unset or unparsable values fall back
/// to the documented defaults.
#[derive(Debug, Clone)]
pub struct SettingsApi<B> {
    db: B,
}

impl<B> SettingsApi<B>
where B: StorefrontDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The exchange rate applied when converting native-currency deposits at approval
    /// time.
    pub async fn exchange_rate(&self) -> Result<f64, StorefrontError> {
        self.fetch_f64(EXCHANGE_RATE_KEY, DEFAULT_EXCHANGE_RATE).await
    }

    pub async fn set_exchange_rate(&self, rate: f64) -> Result<(), StorefrontError> {
        if rate <= 0.0 {
            return Err(StorefrontError::Validation(format!("Exchange rate must be positive, got {rate}")));
        }
        self.db.set_setting(EXCHANGE_RATE_KEY, &rate.to_string()).await
    }

    /// Commission percentage withheld from approved deposits. Zero by default.
    pub async fn deposit_commission_pct(&self) -> Result<f64, StorefrontError> {
        self.fetch_f64(DEPOSIT_COMMISSION_KEY, 0.0).await
    }

    pub async fn set_deposit_commission_pct(&self, pct: f64) -> Result<(), StorefrontError> {
        if !(0.0..=100.0).contains(&pct) {
            return Err(StorefrontError::Validation(format!("Commission must be between 0 and 100, got {pct}")));
        }
        self.db.set_setting(DEPOSIT_COMMISSION_KEY, &pct.to_string()).await
    }

    /// The markup classification table. An empty no-op table when none is configured.
    pub async fn markup_rules(&self) -> Result<MarkupRules, StorefrontError> {
        let Some(raw) = self.db.fetch_setting(MARKUP_RULES_KEY).await? else {
            return Ok(MarkupRules::default());
        };
        match serde_json::from_str(&raw) {
            Ok(rules) => Ok(rules),
            Err(e) => {
                warn!("⚙️ Stored markup rules are unreadable ({e}). Using the default table.");
                Ok(MarkupRules::default())
            },
        }
    }

    pub async fn set_markup_rules(&self, rules: &MarkupRules) -> Result<(), StorefrontError> {
        let raw = serde_json::to_string(rules)
            .map_err(|e| StorefrontError::Validation(format!("Unencodable markup rules: {e}")))?;
        self.db.set_setting(MARKUP_RULES_KEY, &raw).await
    }

    async fn fetch_f64(&self, key: &str, default: f64) -> Result<f64, StorefrontError> {
        let value = match self.db.fetch_setting(key).await? {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("⚙️ Setting {key} holds an unparsable value ({raw}). Using the default {default}.");
                default
            }),
            None => default,
        };
        Ok(value)
    }
}
