// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The document committer: the only writer of the structured store.
//!
//! [`DocumentCommitter::push`] runs the whole read → merge → validate →
//! persist sequence inside the store's critical section, then publishes
//! [`SyncEvent::DocumentUpdated`] with the committed snapshot. A failure
//! at any step leaves the document at its pre-write state and publishes
//! nothing.

use std::time::Instant;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::events::{EventBus, SyncEvent};
use crate::record::{now_millis, AccountingRecord};

use super::StructuredStore;

/// Turns a domain entity into document nodes and merges them into the
/// offline document.
#[derive(Clone)]
pub struct DocumentCommitter {
    store: StructuredStore,
    bus: EventBus,
}

impl DocumentCommitter {
    #[must_use]
    pub fn new(store: StructuredStore, bus: EventBus) -> Self {
        Self { store, bus }
    }

    /// Merge `record` into the offline document.
    ///
    /// Replaces the accounting node matching `record.number` (or creates
    /// it), creates the referenced letterhead node if absent, and stamps
    /// the sync metadata. The resulting document is schema-validated and
    /// persisted before `DocumentUpdated` is announced.
    pub async fn push(&self, record: &AccountingRecord) -> Result<(), SyncError> {
        record.check_contract()?;

        let start = Instant::now();
        let updated_at = now_millis();
        let result = self
            .store
            .update(|document| {
                document.upsert_accounting(record);
                document.sync.last_synced_at = updated_at;
                document.sync.commits += 1;
                Ok(())
            })
            .await;

        match result {
            Ok(document) => {
                crate::metrics::record_commit("success");
                crate::metrics::record_commit_latency(start.elapsed());
                debug!(
                    number = record.number,
                    accountings = document.accountings.len(),
                    "accounting committed to offline document"
                );
                self.bus
                    .publish(SyncEvent::DocumentUpdated { document, updated_at });
                Ok(())
            }
            Err(err) => {
                crate::metrics::record_commit("failure");
                warn!(number = record.number, error = %err, "offline document commit failed");
                Err(err)
            }
        }
    }
}
