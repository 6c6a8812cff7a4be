//! Adapters between the storefront engine's trait seams and the real external
//! services.
mod provider;

pub use provider::RemoteProvider;
