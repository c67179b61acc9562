// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The offline fetch path.
//!
//! Reads the structured store under its lock, resolves letterhead
//! references, and returns accountings sorted ascending by number.
//!
//! The repository also owns the convergence subscription: a background
//! task drains [`SyncEvent::CollectionReceived`] events into the
//! document committer, sequentially, so the offline cache converges
//! with the latest online snapshot. The subscription is established at
//! construction and torn down when the repository is dropped.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::record::AccountingRecord;
use crate::store::{DocumentCommitter, StructuredStore};

/// Serves accountings from the offline document.
pub struct OfflineRepository {
    store: StructuredStore,
    subscription: JoinHandle<()>,
}

impl OfflineRepository {
    /// Build the offline path and start its convergence subscription.
    #[must_use]
    pub fn new(store: StructuredStore, committer: DocumentCommitter, bus: &EventBus) -> Self {
        let mut rx = bus.subscribe();
        let subscription = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SyncEvent::CollectionReceived { entities }) => {
                        debug!(count = entities.len(), "converging offline cache");
                        for entity in &entities {
                            // One bad entity must not stop the rest of the
                            // snapshot from converging.
                            if let Err(err) = committer.push(entity).await {
                                warn!(
                                    number = entity.number,
                                    error = %err,
                                    "failed to converge accounting into offline cache"
                                );
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "offline convergence lagged, dropped events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self {
            store,
            subscription,
        }
    }

    /// Read every accounting from the offline document, sorted ascending
    /// by number.
    ///
    /// The whole snapshot-then-parse read runs under the store lock, so
    /// it never interleaves with a committer write.
    pub async fn fetch_all(&self) -> Result<Vec<AccountingRecord>, SyncError> {
        let mut records = self
            .store
            .with_document(|document| document.accountings())
            .await??;
        records.sort_by_key(|record| record.number);
        crate::metrics::record_fetch("offline", "success");
        Ok(records)
    }
}

impl Drop for OfflineRepository {
    fn drop(&mut self) {
        // A disposed repository must not keep receiving events.
        self.subscription.abort();
    }
}
