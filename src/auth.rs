//! Identity endpoint authentication for both gateway protocols

use crate::api;
use crate::config::{ClientConfig, GatewayCredentials, ProtocolVariant, V1Credentials, V2Credentials};
use crate::credential::{Credential, CredentialStore};
use crate::{QPayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Timestamp prefix used in identity endpoint error messages
const ERROR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Produces credentials from the gateway's identity endpoint.
///
/// One implementation per protocol variant; a client picks one at
/// construction and never switches.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// Protocol variant spoken by this authenticator
    fn variant(&self) -> ProtocolVariant;

    /// Request a brand new credential from `/auth/token`
    async fn authenticate(&self) -> Result<Credential>;

    /// Exchange a refresh token at `/auth/refresh`
    async fn refresh(&self, refresh_token: &str) -> Result<Credential>;

    /// Return the cached credential while it is valid at `now`, otherwise
    /// authenticate. Does not write to the store.
    async fn obtain_credential(
        &self,
        store: &CredentialStore,
        now: DateTime<Utc>,
    ) -> Result<Credential> {
        if let Some(credential) = store.valid_credential(now).await {
            debug!("Reusing cached {} credential", self.variant());
            return Ok(credential);
        }

        info!("Requesting new {} credential", self.variant());
        self.authenticate().await
    }
}

/// Build the authenticator matching the configured credentials
pub fn for_config(http: Client, config: &ClientConfig) -> Arc<dyn Authenticator> {
    let endpoint = config.base_url().to_string();
    match &config.credentials {
        GatewayCredentials::V1(credentials) => {
            Arc::new(V1Authenticator::new(http, endpoint, credentials.clone()))
        }
        GatewayCredentials::V2(credentials) => {
            Arc::new(V2Authenticator::new(http, endpoint, credentials.clone()))
        }
    }
}

/// V1 token request body
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// V1 authenticator: client credentials posted as JSON
#[derive(Clone)]
pub struct V1Authenticator {
    http: Client,
    endpoint: String,
    credentials: V1Credentials,
}

impl V1Authenticator {
    pub fn new(http: Client, endpoint: impl Into<String>, credentials: V1Credentials) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        }
    }
}

impl std::fmt::Debug for V1Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V1Authenticator")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.credentials.client_id)
            .finish()
    }
}

#[async_trait]
impl Authenticator for V1Authenticator {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::V1
    }

    async fn authenticate(&self) -> Result<Credential> {
        let body = TokenRequest {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            grant_type: &self.credentials.grant_type,
            refresh_token: &self.credentials.refresh_token,
        };

        let request = self
            .http
            .request(api::AUTH_TOKEN.method.clone(), api::AUTH_TOKEN.url(&self.endpoint, ""))
            .header(header::CONTENT_TYPE, api::CONTENT_TYPE)
            .body(serde_json::to_vec(&body)?);

        send_identity_request(request, "auth").await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        refresh_with(&self.http, &self.endpoint, refresh_token).await
    }
}

/// V2 authenticator: empty body, HTTP basic auth
#[derive(Clone)]
pub struct V2Authenticator {
    http: Client,
    endpoint: String,
    credentials: V2Credentials,
}

impl V2Authenticator {
    pub fn new(http: Client, endpoint: impl Into<String>, credentials: V2Credentials) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        }
    }
}

impl std::fmt::Debug for V2Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V2Authenticator")
            .field("endpoint", &self.endpoint)
            .field("username", &self.credentials.username)
            .finish()
    }
}

#[async_trait]
impl Authenticator for V2Authenticator {
    fn variant(&self) -> ProtocolVariant {
        ProtocolVariant::V2
    }

    async fn authenticate(&self) -> Result<Credential> {
        let request = self
            .http
            .request(api::AUTH_TOKEN.method.clone(), api::AUTH_TOKEN.url(&self.endpoint, ""))
            .header(header::CONTENT_TYPE, api::CONTENT_TYPE)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password));

        send_identity_request(request, "auth").await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        refresh_with(&self.http, &self.endpoint, refresh_token).await
    }
}

/// `/auth/refresh` is identical in both protocols
async fn refresh_with(http: &Client, endpoint: &str, refresh_token: &str) -> Result<Credential> {
    let request = http
        .request(api::AUTH_REFRESH.method.clone(), api::AUTH_REFRESH.url(endpoint, ""))
        .header(header::CONTENT_TYPE, api::CONTENT_TYPE)
        .bearer_auth(refresh_token);

    send_identity_request(request, "token refresh").await
}

async fn send_identity_request(request: RequestBuilder, action: &str) -> Result<Credential> {
    let response = request.send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("QPay {} rejected with status {}", action, status);
        return Err(QPayError::authentication(format!(
            "{}-QPay {} response: {}",
            Local::now().format(ERROR_TIME_FORMAT),
            action,
            status
        )));
    }

    let body = response.bytes().await?;
    let credential: Credential = serde_json::from_slice(&body)?;
    if credential.access_token.is_empty() {
        return Err(QPayError::authentication(format!(
            "QPay {} response did not contain an access token",
            action
        )));
    }

    debug!("QPay {} succeeded, expires at {}", action, credential.expires_at);
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn token_body(token: &str, expires_at: DateTime<Utc>) -> String {
        json!({
            "token_type": "bearer",
            "access_token": token,
            "refresh_token": "refresh",
            "expires_in": expires_at.timestamp(),
            "refresh_expires_in": (expires_at + Duration::days(1)).timestamp()
        })
        .to_string()
    }

    fn v2(server: &ServerGuard) -> V2Authenticator {
        V2Authenticator::new(Client::new(), server.url(), V2Credentials::new("user", "pass"))
    }

    #[tokio::test]
    async fn test_v1_posts_json_credentials() {
        let mut server = Server::new_async().await;
        let expires = Utc::now() + Duration::days(1);
        let m = server
            .mock("POST", "/auth/token")
            .match_header("content-type", "application/json")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({
                "client_id": "id",
                "client_secret": "secret",
                "grant_type": "client",
                "refresh_token": ""
            })))
            .with_status(200)
            .with_body(token_body("v1-token", expires))
            .create_async()
            .await;

        let auth = V1Authenticator::new(Client::new(), server.url(), V1Credentials::new("id", "secret"));
        let credential = auth.authenticate().await.unwrap();

        m.assert_async().await;
        assert_eq!(credential.access_token, "v1-token");
        assert_eq!(credential.expires_at, expires.timestamp());
    }

    #[tokio::test]
    async fn test_v2_uses_basic_auth() {
        use base64::Engine;

        let mut server = Server::new_async().await;
        let basic = base64::engine::general_purpose::STANDARD.encode("user:pass");
        let m = server
            .mock("POST", "/auth/token")
            .match_header("authorization", format!("Basic {}", basic).as_str())
            .match_body("")
            .with_status(200)
            .with_body(token_body("v2-token", Utc::now() + Duration::days(1)))
            .create_async()
            .await;

        let credential = v2(&server).authenticate().await.unwrap();

        m.assert_async().await;
        assert_eq!(credential.access_token, "v2-token");
    }

    #[tokio::test]
    async fn test_non_200_is_authentication_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/token")
            .with_status(401)
            .with_body("{\"error\":\"NO_CREDENDIALS\"}")
            .create_async()
            .await;

        let err = v2(&server).authenticate().await.unwrap_err();

        assert!(err.is_authentication());
        let message = err.to_string();
        assert!(message.contains("-QPay auth response: 401 Unauthorized"), "{}", message);
    }

    #[tokio::test]
    async fn test_malformed_token_response_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/token")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = v2(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, QPayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_access_token_is_rejected() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/token")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = v2(&server).authenticate().await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_obtain_credential_fast_path() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/token")
            .expect(0)
            .create_async()
            .await;

        let now = Utc::now();
        let cached = Credential::new("cached", now + Duration::hours(13));
        let store = CredentialStore::with_credential(cached.clone());

        let credential = v2(&server).obtain_credential(&store, now).await.unwrap();

        m.assert_async().await;
        assert_eq!(credential, cached);
    }

    #[tokio::test]
    async fn test_obtain_credential_renews_inside_margin() {
        let mut server = Server::new_async().await;
        let now = Utc::now();
        let m = server
            .mock("POST", "/auth/token")
            .with_status(200)
            .with_body(token_body("fresh", now + Duration::days(1)))
            .expect(1)
            .create_async()
            .await;

        let store = CredentialStore::with_credential(Credential::new("stale", now + Duration::hours(11)));
        let credential = v2(&server).obtain_credential(&store, now).await.unwrap();

        m.assert_async().await;
        assert_eq!(credential.access_token, "fresh");
        // obtaining never writes; installing is the executor's job
        assert_eq!(store.current().await.unwrap().access_token, "stale");
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token_as_bearer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", "Bearer refresh-me")
            .with_status(200)
            .with_body(token_body("refreshed", Utc::now() + Duration::days(1)))
            .create_async()
            .await;

        let credential = v2(&server).refresh("refresh-me").await.unwrap();

        m.assert_async().await;
        assert_eq!(credential.access_token, "refreshed");
    }

    #[tokio::test]
    async fn test_refresh_failure_message() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/refresh")
            .with_status(400)
            .create_async()
            .await;

        let auth = V1Authenticator::new(Client::new(), server.url(), V1Credentials::new("id", "secret"));
        let err = auth.refresh("expired").await.unwrap_err();

        assert!(err.to_string().contains("-QPay token refresh response: 400 Bad Request"));
    }
}
