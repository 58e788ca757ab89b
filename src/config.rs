//! Client configuration

use crate::{QPayError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Production endpoint of the V2 merchant API
pub const DEFAULT_V2_ENDPOINT: &str = "https://merchant.qpay.mn/v2";
/// Sandbox endpoint of the V2 merchant API
pub const SANDBOX_V2_ENDPOINT: &str = "https://merchant-sandbox.qpay.mn/v2";
/// Production endpoint of the V1 merchant API
pub const DEFAULT_V1_ENDPOINT: &str = "https://api.qpay.mn/v1";

/// Gateway protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVariant {
    V1,
    V2,
}

impl ProtocolVariant {
    /// Get the variant identifier string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVariant::V1 => "V1",
            ProtocolVariant::V2 => "V2",
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client credentials for the V1 identity endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct V1Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub refresh_token: String,
}

impl V1Credentials {
    /// Create V1 credentials with the `client` grant type and no refresh token
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: "client".to_string(),
            refresh_token: String::new(),
        }
    }

    /// Set the grant type
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }

    /// Set the refresh token sent with the token request
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = refresh_token.into();
        self
    }
}

/// Basic-auth credentials for the V2 identity endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct V2Credentials {
    pub username: String,
    pub password: String,
}

impl V2Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Credentials for one protocol variant. Which one is present decides the
/// variant of the client.
#[derive(Clone, PartialEq, Eq)]
pub enum GatewayCredentials {
    V1(V1Credentials),
    V2(V2Credentials),
}

impl GatewayCredentials {
    pub fn variant(&self) -> ProtocolVariant {
        match self {
            GatewayCredentials::V1(_) => ProtocolVariant::V1,
            GatewayCredentials::V2(_) => ProtocolVariant::V2,
        }
    }
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayCredentials::V1(c) => f
                .debug_struct("V1")
                .field("client_id", &c.client_id)
                .field("client_secret", &"<redacted>")
                .field("grant_type", &c.grant_type)
                .field("refresh_token", &"<redacted>")
                .finish(),
            GatewayCredentials::V2(c) => f
                .debug_struct("V2")
                .field("username", &c.username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration of a QPay client. Immutable once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the gateway, e.g. `https://merchant.qpay.mn/v2`
    pub endpoint: String,
    /// Identity credentials, which also select the protocol variant
    pub credentials: GatewayCredentials,
    /// Base callback URL the gateway notifies on payment
    pub callback: String,
    /// Merchant invoice code (V2) or bill template id (V1)
    pub invoice_code: String,
    /// Merchant id
    pub merchant_id: String,
    /// Request timeout applied to every round trip
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration for the V1 protocol
    pub fn v1(endpoint: impl Into<String>, credentials: V1Credentials) -> Self {
        Self::with_credentials(endpoint, GatewayCredentials::V1(credentials))
    }

    /// Create a configuration for the V2 protocol
    pub fn v2(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_credentials(
            endpoint,
            GatewayCredentials::V2(V2Credentials::new(username, password)),
        )
    }

    fn with_credentials(endpoint: impl Into<String>, credentials: GatewayCredentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            callback: String::new(),
            invoice_code: String::new(),
            merchant_id: String::new(),
            timeout: None,
        }
    }

    /// Build a configuration from `QPAY_*` environment variables.
    ///
    /// `QPAY_USERNAME`/`QPAY_PASSWORD` select V2, `QPAY_CLIENT_ID`/`QPAY_CLIENT_SECRET`
    /// select V1. `QPAY_ENDPOINT` defaults to the production endpoint of the variant.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| env::var(name).unwrap_or_default();

        let config = if !var("QPAY_USERNAME").is_empty() {
            let endpoint = env::var("QPAY_ENDPOINT").unwrap_or_else(|_| DEFAULT_V2_ENDPOINT.to_string());
            Self::v2(endpoint, var("QPAY_USERNAME"), var("QPAY_PASSWORD"))
        } else if !var("QPAY_CLIENT_ID").is_empty() {
            let endpoint = env::var("QPAY_ENDPOINT").unwrap_or_else(|_| DEFAULT_V1_ENDPOINT.to_string());
            let mut credentials = V1Credentials::new(var("QPAY_CLIENT_ID"), var("QPAY_CLIENT_SECRET"))
                .with_refresh_token(var("QPAY_REFRESH_TOKEN"));
            if let Ok(grant_type) = env::var("QPAY_GRANT_TYPE") {
                credentials = credentials.with_grant_type(grant_type);
            }
            Self::v1(endpoint, credentials)
        } else {
            return Err(QPayError::config(
                "Missing credentials: set QPAY_USERNAME/QPAY_PASSWORD or QPAY_CLIENT_ID/QPAY_CLIENT_SECRET",
            ));
        };

        let config = config
            .with_callback(var("QPAY_CALLBACK_URL"))
            .with_invoice_code(var("QPAY_INVOICE_CODE"))
            .with_merchant_id(var("QPAY_MERCHANT_ID"));

        config.validate()?;
        Ok(config)
    }

    /// Protocol variant selected by the credentials
    pub fn variant(&self) -> ProtocolVariant {
        self.credentials.variant()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(QPayError::config("Endpoint cannot be empty"));
        }

        let parsed = url::Url::parse(&self.endpoint)
            .map_err(|e| QPayError::config(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(QPayError::config(
                "Endpoint must start with http:// or https://",
            ));
        }

        match &self.credentials {
            GatewayCredentials::V1(c) if c.client_id.is_empty() || c.client_secret.is_empty() => {
                Err(QPayError::config("V1 requires client_id and client_secret"))
            }
            GatewayCredentials::V2(c) if c.username.is_empty() || c.password.is_empty() => {
                Err(QPayError::config("V2 requires username and password"))
            }
            _ => Ok(()),
        }
    }

    /// Set the callback base URL
    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = callback.into();
        self
    }

    /// Set the merchant invoice code
    pub fn with_invoice_code(mut self, invoice_code: impl Into<String>) -> Self {
        self.invoice_code = invoice_code.into();
        self
    }

    /// Set the merchant id
    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = merchant_id.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Endpoint without a trailing slash, ready for path concatenation
    pub(crate) fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
