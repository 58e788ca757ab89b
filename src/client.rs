//! QPay client session and authenticated request executor

use crate::api::{self, Endpoint};
use crate::auth::{self, Authenticator};
use crate::config::{ClientConfig, ProtocolVariant};
use crate::credential::{Credential, CredentialStore};
use crate::{QPayError, Result};
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker for requests without a body
pub(crate) const NO_BODY: Option<&()> = None;

/// Client session for the QPay gateway.
///
/// Owns the configuration, one authenticator and one credential slot.
/// Clones share the same session.
#[derive(Debug, Clone)]
pub struct QPayClient {
    inner: Arc<Session>,
}

#[derive(Debug)]
struct Session {
    config: ClientConfig,
    http: Client,
    authenticator: Arc<dyn Authenticator>,
    store: CredentialStore,
}

impl QPayClient {
    /// Create a client. No network activity happens until the first call.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::build(config, CredentialStore::new())
    }

    fn build(config: ClientConfig, store: CredentialStore) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder();
        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        let http = client_builder
            .build()
            .map_err(|e| QPayError::config(format!("Failed to create HTTP client: {}", e)))?;

        let authenticator = auth::for_config(http.clone(), &config);

        Ok(Self {
            inner: Arc::new(Session {
                config,
                http,
                authenticator,
                store,
            }),
        })
    }

    /// Create a client and, for V2, authenticate right away.
    ///
    /// The eager login is best-effort: a failure is logged and the slot stays
    /// empty, so the first business call authenticates again and reports the
    /// error. V1 clients stay lazy.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;

        if client.variant() == ProtocolVariant::V2 {
            match client.inner.authenticator.authenticate().await {
                Ok(credential) => client.inner.store.replace(credential).await,
                Err(e) => warn!("Initial QPay authentication failed: {}", e),
            }
        }

        Ok(client)
    }

    /// Create a client whose store is seeded with `credential`
    pub fn with_credential(config: ClientConfig, credential: Credential) -> Result<Self> {
        Self::build(config, CredentialStore::with_credential(credential))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Protocol variant of this client
    pub fn variant(&self) -> ProtocolVariant {
        self.inner.config.variant()
    }

    /// Credential store of this session
    pub fn credential_store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Obtain a valid credential and install it into the store.
    ///
    /// The renewal guard is held across the check and the replacement, so
    /// concurrent callers never authenticate twice for the same expiry.
    pub async fn credential(&self) -> Result<Credential> {
        let store = &self.inner.store;
        let _renewal = store.begin_renewal().await;

        let credential = self
            .inner
            .authenticator
            .obtain_credential(store, Utc::now())
            .await?;
        store.replace(credential.clone()).await;

        Ok(credential)
    }

    /// Exchange the cached refresh token for a new credential and install it.
    ///
    /// Not part of the automatic renewal path, which always authenticates
    /// from scratch.
    pub async fn refresh_credential(&self) -> Result<Credential> {
        let store = &self.inner.store;
        let _renewal = store.begin_renewal().await;

        let refresh_token = store
            .current()
            .await
            .map(|credential| credential.refresh_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| QPayError::authentication("No refresh token cached"))?;

        let credential = self.inner.authenticator.refresh(&refresh_token).await?;
        store.replace(credential.clone()).await;

        Ok(credential)
    }

    /// Send an authenticated request and return the raw response body.
    ///
    /// `body` is sent as JSON when present, otherwise the payload is empty.
    /// A failed authentication returns before the business endpoint is
    /// contacted. Any status other than 200 becomes [`QPayError::Remote`]
    /// carrying the response text.
    pub async fn execute<B>(&self, body: Option<&B>, endpoint: &Endpoint, url_suffix: &str) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let credential = self.credential().await?;

        let payload = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let url = endpoint.url(self.inner.config.base_url(), url_suffix);
        debug!("QPay {} {}", endpoint.method, url);

        let response = self
            .inner
            .http
            .request(endpoint.method.clone(), &url)
            .header(header::CONTENT_TYPE, api::CONTENT_TYPE)
            .header(header::AUTHORIZATION, credential.bearer())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!("QPay {} {} failed with status {}", endpoint.method, url, status);
            return Err(QPayError::remote(status, body));
        }

        Ok(bytes.to_vec())
    }

    /// [`execute`](Self::execute) and decode the JSON response
    pub(crate) async fn execute_json<B, T>(&self, body: Option<&B>, endpoint: &Endpoint, url_suffix: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.execute(body, endpoint, url_suffix).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
