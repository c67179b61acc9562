// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The failover repository: online first, offline after the first
//! connectivity failure.
//!
//! Two states per instance: online (initial) and offline (terminal).
//! A connectivity-classified failure on the remote path sets the sticky
//! flag, announces [`SyncEvent::SystemWentOffline`], and re-issues the
//! request against the offline path. Any other error kind propagates
//! unchanged and the instance stays online. There is no automatic
//! offline → online recovery probe; a new instance starts online.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::record::AccountingRecord;
use crate::remote::OnlineRepository;

use super::OfflineRepository;

/// Orchestrates the online and offline fetch paths for the accounting
/// entity family.
pub struct FailoverRepository {
    online: OnlineRepository,
    offline: OfflineRepository,
    bus: EventBus,
    /// Sticky for the lifetime of this instance.
    offline_mode: AtomicBool,
}

impl FailoverRepository {
    #[must_use]
    pub fn new(online: OnlineRepository, offline: OfflineRepository, bus: EventBus) -> Self {
        Self {
            online,
            offline,
            bus,
            offline_mode: AtomicBool::new(false),
        }
    }

    /// Whether this instance has flipped to the offline path.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline_mode.load(Ordering::Acquire)
    }

    /// Fetch all accountings.
    ///
    /// While online every call goes to the remote path; once a
    /// connectivity failure has been observed, every call goes directly
    /// to the offline document without attempting the network again.
    pub async fn fetch_all(&self) -> Result<Vec<AccountingRecord>, SyncError> {
        if self.is_offline() {
            return self.offline.fetch_all().await;
        }

        match self.online.fetch_all().await {
            Ok(entities) => Ok(entities),
            Err(err) if err.is_connectivity() => {
                self.go_offline(&err);
                self.offline.fetch_all().await
            }
            Err(err) => Err(err),
        }
    }

    /// Flip to offline mode and announce it.
    ///
    /// Concurrent callers can both observe a failure and race here; the
    /// transition event may then be published more than once, which
    /// subscribers tolerate.
    fn go_offline(&self, cause: &SyncError) {
        let was_offline = self.offline_mode.swap(true, Ordering::AcqRel);
        crate::metrics::record_failover();
        warn!(error = %cause, "remote service unreachable, serving from offline document");
        if !was_offline {
            info!("entering offline mode (sticky for this repository instance)");
        }
        self.bus.publish(SyncEvent::SystemWentOffline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::record::{AccessToken, BalanceBelowZeroPolicy, LetterHeadRecord};
    use crate::remote::AccountingApi;
    use crate::store::{DocumentCommitter, StructuredStore};
    use crate::token::{TokenCache, TokenSource};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
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

    enum ApiMode {
        Ok(Vec<AccountingRecord>),
        Connectivity,
        Unauthorized,
    }

    struct ScriptedApi {
        mode: ApiMode,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AccountingApi for ScriptedApi {
        async fn list_accountings(
            &self,
            _token: &AccessToken,
        ) -> Result<Vec<AccountingRecord>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                ApiMode::Ok(entities) => Ok(entities.clone()),
                ApiMode::Connectivity => Err(SyncError::connectivity(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "host unreachable",
                ))),
                ApiMode::Unauthorized => Err(SyncError::Unauthorized {
                    status: 401,
                    message: "credentials rejected".into(),
                }),
            }
        }
    }

    fn record(number: u32, name: &str) -> AccountingRecord {
        AccountingRecord {
            number,
            name: name.to_string(),
            letter_head: LetterHeadRecord {
                number: 1,
                name: "Main office".into(),
            },
            balance_below_zero: BalanceBelowZeroPolicy::None,
            back_dating_window_days: 0,
        }
    }

    struct Fixture {
        repo: FailoverRepository,
        committer: DocumentCommitter,
        bus: EventBus,
        api_calls: Arc<AtomicUsize>,
    }

    fn fixture(mode: ApiMode) -> Fixture {
        let bus = EventBus::default();
        let store = StructuredStore::in_memory();
        let committer = DocumentCommitter::new(store.clone(), bus.clone());
        let offline = OfflineRepository::new(store, committer.clone(), &bus);

        let api_calls = Arc::new(AtomicUsize::new(0));
        let api = Arc::new(ScriptedApi {
            mode,
            calls: api_calls.clone(),
        });
        let tokens = Arc::new(TokenCache::new(Box::new(StaticTokens), bus.clone()));
        let online = OnlineRepository::new(api, tokens, bus.clone());

        Fixture {
            repo: FailoverRepository::new(online, offline, bus.clone()),
            committer,
            bus,
            api_calls,
        }
    }

    #[tokio::test]
    async fn test_online_success_stays_online() {
        let fx = fixture(ApiMode::Ok(vec![record(1, "Cash")]));

        let entities = fx.repo.fetch_all().await.unwrap();
        assert_eq!(entities.len(), 1);
        assert!(!fx.repo.is_offline());
    }

    #[tokio::test]
    async fn test_connectivity_failure_falls_back_to_offline_result() {
        let fx = fixture(ApiMode::Connectivity);
        fx.committer.push(&record(7, "Stock")).await.unwrap();

        let entities = fx.repo.fetch_all().await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].number, 7);
        assert!(fx.repo.is_offline());
    }

    #[tokio::test]
    async fn test_offline_mode_is_sticky() {
        let fx = fixture(ApiMode::Connectivity);

        let _ = fx.repo.fetch_all().await.unwrap();
        assert_eq!(fx.api_calls.load(Ordering::SeqCst), 1);

        // Subsequent calls never touch the remote path again
        let _ = fx.repo.fetch_all().await.unwrap();
        let _ = fx.repo.fetch_all().await.unwrap();
        assert_eq!(fx.api_calls.load(Ordering::SeqCst), 1);
        assert!(fx.repo.is_offline());
    }

    #[tokio::test]
    async fn test_transition_publishes_system_went_offline_once() {
        let fx = fixture(ApiMode::Connectivity);
        let mut rx = fx.bus.subscribe();

        let _ = fx.repo.fetch_all().await.unwrap();
        let _ = fx.repo.fetch_all().await.unwrap();

        let mut offline_events = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, SyncEvent::SystemWentOffline) {
                offline_events += 1;
            }
        }
        assert_eq!(offline_events, 1);
    }

    #[tokio::test]
    async fn test_authorization_failure_propagates_and_stays_online() {
        let fx = fixture(ApiMode::Unauthorized);
        let mut rx = fx.bus.subscribe();

        let err = fx.repo.fetch_all().await.unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized { status: 401, .. }));
        assert!(!fx.repo.is_offline());

        // The remote path is attempted again on the next call
        let _ = fx.repo.fetch_all().await.unwrap_err();
        assert_eq!(fx.api_calls.load(Ordering::SeqCst), 2);

        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, SyncEvent::SystemWentOffline));
        }
    }
}
