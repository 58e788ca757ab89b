//! # qpay - QPay payment gateway client
//!
//! An async client for the QPay merchant API. It creates, fetches and cancels
//! invoices and checks, cancels and refunds payments, speaking either the V1
//! or the V2 protocol of the gateway.
//!
//! Every business call carries a bearer credential obtained from the identity
//! endpoint. The credential is cached per client and renewed once it is
//! within 12 hours of expiry.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod types;

// Re-exports for convenience
pub use client::QPayClient;
pub use config::{ClientConfig, GatewayCredentials, ProtocolVariant, V1Credentials, V2Credentials};
pub use credential::{Credential, CredentialStore};
pub use error::{QPayError, Result};
pub use types::*;

/// Current version of the qpay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }
}
