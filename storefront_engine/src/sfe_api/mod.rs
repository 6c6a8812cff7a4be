//! The public storefront engine APIs.
//!
//! Each API wraps a [`crate::traits::StorefrontDatabase`] backend and exposes one
//! workflow: the ledger ([`ledger_api`]), the purchase gateway and reconciliation loop
//! ([`order_flow_api`]), the deposit approval workflow ([`deposit_api`]) and the
//! runtime settings store ([`settings_api`]).
pub mod deposit_api;
pub mod ledger_api;
pub mod order_flow_api;
pub mod settings_api;
