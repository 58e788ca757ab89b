//! Cached bearer credential and its store

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Credentials are renewed this long before they actually expire.
pub const RENEWAL_MARGIN_HOURS: i64 = 12;

/// Bearer credential issued by the identity endpoint.
///
/// The gateway reports absolute unix timestamps under the `expires_in` and
/// `refresh_expires_in` names.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp after which the access token is rejected
    #[serde(rename = "expires_in")]
    pub expires_at: i64,
    /// Unix timestamp after which the refresh token is rejected
    #[serde(rename = "refresh_expires_in")]
    pub refresh_expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(rename = "not-before-policy", skip_serializing_if = "Option::is_none")]
    pub not_before_policy: Option<i64>,
}

impl Credential {
    /// Create a credential from an access token and its expiry
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: expires_at.timestamp(),
            ..Default::default()
        }
    }

    /// Set the refresh token and its expiry
    pub fn with_refresh_token(
        mut self,
        refresh_token: impl Into<String>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        self.refresh_token = refresh_token.into();
        self.refresh_expires_at = refresh_expires_at.timestamp();
        self
    }

    /// Expiry of the access token, `None` when absent
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_at <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Whether the credential may still be used at `now`, keeping the renewal margin
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at() {
            Some(expires_at) => now < expires_at - Duration::hours(RENEWAL_MARGIN_HOURS),
            None => false,
        }
    }

    /// `Authorization` header value for business calls
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Holds the credential of one client session.
///
/// The slot is only ever replaced as a whole. Renewal is single-flight: the
/// executor holds the renewal guard across the validity check and the
/// replacement, so concurrent callers near expiry wait for one round trip.
#[derive(Debug, Default)]
pub struct CredentialStore {
    slot: RwLock<Option<Credential>>,
    renewal: Mutex<()>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a credential
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
            renewal: Mutex::new(()),
        }
    }

    /// True iff a credential is present and `now` is before `expires_at - 12h`
    pub async fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.valid_credential(now).await.is_some()
    }

    /// The stored credential if it is still valid at `now`
    pub async fn valid_credential(&self, now: DateTime<Utc>) -> Option<Credential> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_valid_at(now))
            .cloned()
    }

    /// Snapshot of the stored credential, valid or not
    pub async fn current(&self) -> Option<Credential> {
        self.slot.read().await.clone()
    }

    /// Swap in a new credential
    pub async fn replace(&self, credential: Credential) {
        *self.slot.write().await = Some(credential);
    }

    /// Forget the stored credential
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }

    pub(crate) async fn begin_renewal(&self) -> MutexGuard<'_, ()> {
        self.renewal.lock().await
    }
}
