//! # Database management and control.
//!
//! This module defines the interface contracts that storefront engine *backends* and
//! external collaborators must implement.
//!
//! * [`StorefrontDatabase`] defines the highest level of behaviour for storage
//!   backends: the ledger, order reservations and their terminal transitions, and
//!   deposit decisions. Every transition that pairs a status write with a balance
//!   mutation must be atomic in the backend.
//! * [`AccountManagement`] provides the read-side queries over accounts, orders and
//!   deposit requests.
//! * [`FulfillmentProvider`] is the engine's view of the external provider: submit a
//!   purchase, poll for outcomes. The HTTP client lives outside the engine; tests use
//!   a scripted mock.

mod account_management;
mod data_objects;
mod fulfillment;
mod storefront_database;

pub use account_management::AccountManagement;
pub use data_objects::{BulkActionResult, DepositBreakdown, ReconcileSummary, SubmissionReceipt};
pub use fulfillment::{FulfillmentProvider, ProviderError, RemoteOutcome, StatusRecord, SubmitResponse};
pub use storefront_database::{StorefrontDatabase, StorefrontError};
