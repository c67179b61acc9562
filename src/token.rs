// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Access-token cache with expiry-based refresh.
//!
//! [`TokenCache`] serves the cached token while it has more than the
//! safety margin of validity left, and otherwise refreshes it through
//! the [`TokenSource`] while holding its lock. Concurrent callers that
//! all observe the same expired token serialize on that lock, so a burst
//! triggers exactly one refresh. A failed refresh propagates to the
//! caller and leaves the cached token untouched; the next call retries.
//!
//! Every freshly acquired token is announced as
//! [`SyncEvent::TokenAcquired`]. Externally installed tokens
//! ([`TokenCache::set_token`], e.g. restored from a prior session) are
//! not announced.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::record::AccessToken;

/// Safety margin below which a cached token is considered expired.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// The token-issuing boundary.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire a fresh token from the token endpoint.
    async fn acquire(&self) -> Result<AccessToken, SyncError>;
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

/// [`TokenSource`] backed by an OAuth-style client-credentials endpoint.
pub struct HttpTokenSource {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl HttpTokenSource {
    /// Build from configuration. Fails if `token_url` is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let token_url = config
            .token_url
            .clone()
            .ok_or_else(|| SyncError::Contract("token_url is not configured".into()))?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|err| SyncError::system("failed to build HTTP client", err))?;
        Ok(Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn acquire(&self) -> Result<AccessToken, SyncError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, body));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| SyncError::system("malformed token endpoint response", err))?;
        Ok(AccessToken::expiring_in(
            body.token_type,
            body.access_token,
            Duration::from_secs(body.expires_in),
        ))
    }
}

/// Caches the bearer credential for remote calls.
pub struct TokenCache {
    source: Box<dyn TokenSource>,
    bus: EventBus,
    margin: Duration,
    current: Mutex<Option<AccessToken>>,
    refreshes: AtomicU64,
}

impl TokenCache {
    #[must_use]
    pub fn new(source: Box<dyn TokenSource>, bus: EventBus) -> Self {
        Self::with_margin(source, bus, DEFAULT_SAFETY_MARGIN)
    }

    #[must_use]
    pub fn with_margin(source: Box<dyn TokenSource>, bus: EventBus, margin: Duration) -> Self {
        Self {
            source,
            bus,
            margin,
            current: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// The current token, refreshed if absent or within the safety
    /// margin of expiry. Never returns an expired token.
    ///
    /// The refresh runs while the cache lock is held, so a burst of
    /// concurrent callers observing the same stale token performs a
    /// single refresh.
    pub async fn token(&self) -> Result<AccessToken, SyncError> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if token.is_fresh(self.margin) {
                return Ok(token.clone());
            }
        }

        match self.source.acquire().await {
            Ok(token) => {
                *current = Some(token.clone());
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_token_refresh("success");
                debug!(expires_at = token.expires_at, "access token refreshed");
                self.bus.publish(SyncEvent::TokenAcquired {
                    token: token.clone(),
                });
                Ok(token)
            }
            Err(err) => {
                // Cached token left untouched; the next call retries.
                crate::metrics::record_token_refresh("failure");
                warn!(error = %err, kind = err.kind(), "access token refresh failed");
                Err(err)
            }
        }
    }

    /// Install an externally obtained token (e.g. restored from a prior
    /// application session). Does not publish `TokenAcquired`.
    pub async fn set_token(&self, token: AccessToken) {
        *self.current.lock().await = Some(token);
    }

    /// Non-blocking snapshot of the cached token, for diagnostics only.
    /// May return a token inside the safety margin.
    pub async fn peek(&self) -> Option<AccessToken> {
        self.current.lock().await.clone()
    }

    /// Number of refreshes performed since construction.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}
