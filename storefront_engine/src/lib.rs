//! Storefront Engine
//!
//! The storefront engine is the order lifecycle and balance-reconciliation core of a
//! balance-backed storefront bot. Users spend a wallet balance to submit purchases that
//! are fulfilled either by an external top-up provider (asynchronously, confirmed by
//! polling) or manually by staff. This library owns every balance mutation and every
//! order state transition; the chat-platform front end renders the events it emits.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). Low-level, table-per-module
//!    SQLite access. You should never need to touch it directly; use the public APIs
//!    instead. The record types live in [`db_types`] and are public.
//! 2. The public API ([`mod@sfe_api`]): the ledger, the order flow (submission gateway,
//!    reconciliation pass, manual local-order fulfillment), the deposit approval
//!    workflow and the settings store. Backends implement the traits in [`traits`].
//! 3. Events ([`mod@events`]): a small hook system through which terminal transitions
//!    are reported to the notification layer. Event delivery is best-effort and never
//!    rolls back a state change.

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod sfe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use sfe_api::{
    deposit_api::DepositApi,
    ledger_api::LedgerApi,
    order_flow_api::OrderFlowApi,
    settings_api::SettingsApi,
};
pub use traits::{AccountManagement, FulfillmentProvider, StorefrontDatabase, StorefrontError};
