//! HTTP client for the external top-up fulfillment provider.
//!
//! The provider exposes a small REST API: submit an order, poll order statuses in bulk,
//! and fetch the product catalog. All calls are authenticated with a static `api-token`
//! header and run under a bounded timeout. Submission outcomes are three-valued:
//! accepted, explicitly rejected (with a provider reason code), or unknown (timeout),
//! and callers must treat "unknown" differently from "rejected".
mod api;
mod config;
mod error;

mod data_objects;

pub use api::TopupApi;
pub use config::TopupConfig;
pub use data_objects::{
    OrderStatusRecord,
    ProviderProduct,
    ProviderProfile,
    ProviderResponse,
    RemoteOutcome,
    SubmitOutcome,
    CODE_PROVIDER_BALANCE,
    CODE_QTY_UNAVAILABLE,
};
pub use error::TopupApiError;
