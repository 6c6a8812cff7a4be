//! The storefront bot service binary support library.
//!
//! Wires the storefront engine to the real top-up provider, installs the notification
//! hooks, and drives the periodic reconciliation worker. The chat front end talks to
//! the same [`storefront_engine`] APIs this crate constructs.
pub mod config;
pub mod integrations;
pub mod status_worker;
