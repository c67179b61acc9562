// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The remote fetch path.
//!
//! [`OnlineRepository`] obtains a token from the [`TokenCache`], issues
//! one authenticated HTTP call per logical operation through the
//! [`AccountingApi`] boundary, and on success publishes
//! [`SyncEvent::CollectionReceived`] so the offline cache converges.
//! Failures are classified at the boundary ([`SyncError`]) and never
//! retried here; the failover layer decides what a connectivity failure
//! means.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::record::{AccessToken, AccountingRecord};
use crate::token::TokenCache;

/// The remote accounting service boundary.
#[async_trait]
pub trait AccountingApi: Send + Sync {
    /// List all accountings visible to the authenticated client.
    async fn list_accountings(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<AccountingRecord>, SyncError>;
}

/// [`AccountingApi`] over HTTP with bearer authentication.
pub struct HttpAccountingApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountingApi {
    /// Build from configuration. Fails if `remote_base_url` is not
    /// configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let base_url = config
            .remote_base_url
            .clone()
            .ok_or_else(|| SyncError::Contract("remote_base_url is not configured".into()))?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|err| SyncError::system("failed to build HTTP client", err))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AccountingApi for HttpAccountingApi {
    async fn list_accountings(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<AccountingRecord>, SyncError> {
        let url = format!("{}/accountings", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token.authorization())
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::from_status(status, body));
        }

        response
            .json::<Vec<AccountingRecord>>()
            .await
            .map_err(|err| SyncError::system("malformed accounting collection response", err))
    }
}

/// Fetches accountings from the remote service.
pub struct OnlineRepository {
    api: Arc<dyn AccountingApi>,
    tokens: Arc<TokenCache>,
    bus: EventBus,
}

impl OnlineRepository {
    #[must_use]
    pub fn new(api: Arc<dyn AccountingApi>, tokens: Arc<TokenCache>, bus: EventBus) -> Self {
        Self { api, tokens, bus }
    }

    /// Fetch the full accounting collection from the remote service.
    ///
    /// On success the collection is announced as `CollectionReceived`;
    /// the caller's result is not delayed by the offline cache
    /// converging from that event.
    pub async fn fetch_all(&self) -> Result<Vec<AccountingRecord>, SyncError> {
        let start = Instant::now();
        let token = self.tokens.token().await?;
        match self.api.list_accountings(&token).await {
            Ok(entities) => {
                crate::metrics::record_fetch("online", "success");
                crate::metrics::record_fetch_latency("online", start.elapsed());
                debug!(count = entities.len(), "remote accounting collection received");
                self.bus.publish(SyncEvent::CollectionReceived {
                    entities: entities.clone(),
                });
                Ok(entities)
            }
            Err(err) => {
                crate::metrics::record_fetch("online", "failure");
                warn!(error = %err, kind = err.kind(), "remote accounting fetch failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BalanceBelowZeroPolicy, LetterHeadRecord};
    use crate::token::TokenSource;
    use std::time::Duration;

    struct StaticTokens;

    #[async_trait]
    impl TokenSource for StaticTokens {
        async fn acquire(&self) -> Result<AccessToken, SyncError> {
            Ok(AccessToken::expiring_in(
                "Bearer".into(),
                "token".into(),
                Duration::from_secs(3600),
            ))
        }
    }

    struct StaticApi {
        result: fn() -> Result<Vec<AccountingRecord>, SyncError>,
    }

    #[async_trait]
    impl AccountingApi for StaticApi {
        async fn list_accountings(
            &self,
            _token: &AccessToken,
        ) -> Result<Vec<AccountingRecord>, SyncError> {
            (self.result)()
        }
    }

    fn sample() -> Vec<AccountingRecord> {
        vec![AccountingRecord {
            number: 1,
            name: "Cash".into(),
            letter_head: LetterHeadRecord {
                number: 1,
                name: "Main office".into(),
            },
            balance_below_zero: BalanceBelowZeroPolicy::None,
            back_dating_window_days: 0,
        }]
    }

    fn repository(
        result: fn() -> Result<Vec<AccountingRecord>, SyncError>,
    ) -> (OnlineRepository, EventBus) {
        let bus = EventBus::default();
        let tokens = Arc::new(TokenCache::new(Box::new(StaticTokens), bus.clone()));
        (
            OnlineRepository::new(Arc::new(StaticApi { result }), tokens, bus.clone()),
            bus,
        )
    }

    #[tokio::test]
    async fn test_success_publishes_collection_received() {
        let (repo, bus) = repository(|| Ok(sample()));
        let mut rx = bus.subscribe();

        let entities = repo.fetch_all().await.unwrap();
        assert_eq!(entities.len(), 1);

        // TokenAcquired first (fresh refresh), then the collection
        let mut saw_collection = false;
        while let Ok(event) = rx.try_recv() {
            if let SyncEvent::CollectionReceived { entities } = event {
                assert_eq!(entities.len(), 1);
                saw_collection = true;
            }
        }
        assert!(saw_collection);
    }

    #[tokio::test]
    async fn test_failure_publishes_nothing() {
        let (repo, bus) = repository(|| {
            Err(SyncError::connectivity(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "down",
            )))
        });
        let mut rx = bus.subscribe();

        let err = repo.fetch_all().await.unwrap_err();
        assert!(err.is_connectivity());

        while let Ok(event) = rx.try_recv() {
            assert!(
                !matches!(event, SyncEvent::CollectionReceived { .. }),
                "no collection must be announced on failure"
            );
        }
    }
}
