//! Error types for the QPay client

use crate::config::ProtocolVariant;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for QPay operations
pub type Result<T> = std::result::Result<T, QPayError>;

/// Main error type for QPay operations
#[derive(Error, Debug)]
pub enum QPayError {
    /// The identity endpoint refused to issue a credential
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Network failure talking to the gateway
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 answer from a business endpoint. Displays as the raw body.
    #[error("{body}")]
    Remote { status: StatusCode, body: String },

    /// Response body was not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Operation does not exist in the client's protocol variant
    #[error("{operation} is not supported by the {variant} protocol")]
    Unsupported {
        operation: &'static str,
        variant: ProtocolVariant,
    },
}

impl QPayError {
    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a remote error from a business endpoint response
    pub fn remote(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(operation: &'static str, variant: ProtocolVariant) -> Self {
        Self::Unsupported { operation, variant }
    }

    /// HTTP status of a remote failure, if this is one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Whether this error came from the identity endpoint
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
