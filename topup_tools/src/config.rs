use log::*;
use sfb_common::Secret;

const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct TopupConfig {
    /// Base URL of the provider API, e.g. "https://provider.example.com/api".
    pub base_url: String,
    pub api_token: Secret<String>,
    /// Bounded timeout for every provider call, in seconds. A timeout on a submission
    /// is an *unknown* outcome, not a rejection.
    pub timeout_secs: u64,
}

impl TopupConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SFB_PROVIDER_URL").unwrap_or_else(|_| {
            warn!("SFB_PROVIDER_URL not set, using (probably useless) default");
            "https://provider.invalid/api".to_string()
        });
        let api_token = Secret::new(std::env::var("SFB_API_TOKEN").unwrap_or_else(|_| {
            warn!("SFB_API_TOKEN not set, using (probably useless) default");
            "0000000000".to_string()
        }));
        let timeout_secs = std::env::var("SFB_SUBMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SUBMIT_TIMEOUT_SECS);
        Self { base_url, api_token, timeout_secs }
    }
}
