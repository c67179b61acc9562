// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The structured store: owner of the offline document.
//!
//! One mutex guards the document handle. All reads and writes run their
//! entire critical section under it, enforced here rather than trusted
//! to callers: [`StructuredStore::document`] snapshots and validates
//! under the lock, and the committer's read-modify-validate-persist
//! sequence holds it end to end. Lock handles are shared by cloning the
//! store.

pub mod backend;
pub mod committer;
pub mod document;

pub use backend::{DocumentBackend, FileBackend, MemoryBackend};
pub use committer::DocumentCommitter;
pub use document::{OfflineDocument, SyncData, DOCUMENT_NAMESPACE, SCHEMA_VERSION};

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SyncError;

/// The document handle guarded by the store's mutex: the persistence
/// backend plus the last known-good in-memory document.
struct DocumentCell {
    backend: Arc<dyn DocumentBackend>,
    cached: Option<OfflineDocument>,
}

impl DocumentCell {
    /// The current document, loading and parsing it on first access.
    /// A missing backing file materializes as an empty valid document.
    async fn current(&mut self) -> Result<&OfflineDocument, SyncError> {
        let document = match self.cached.take() {
            Some(document) => document,
            None => match self.backend.load().await? {
                Some(bytes) => OfflineDocument::from_bytes(&bytes)?,
                None => OfflineDocument::empty(),
            },
        };
        // Validated on every read: a corrupted document is an error,
        // never silently served.
        document.validate()?;
        Ok(self.cached.insert(document))
    }
}

/// Schema-validated, mutex-guarded access to the offline document.
///
/// Cloning is cheap and clones share the same lock and document.
#[derive(Clone)]
pub struct StructuredStore {
    inner: Arc<Mutex<DocumentCell>>,
}

impl StructuredStore {
    #[must_use]
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DocumentCell {
                backend,
                cached: None,
            })),
        }
    }

    /// A store over an in-memory backend, for tests and ephemeral
    /// sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Read a validated snapshot of the current document.
    pub async fn document(&self) -> Result<OfflineDocument, SyncError> {
        let mut cell = self.inner.lock().await;
        Ok(cell.current().await?.clone())
    }

    /// Run a read-only closure against the validated document, entirely
    /// under the store lock.
    ///
    /// Multi-step reads go through here so they never interleave with a
    /// committer write; the document itself never escapes the lock.
    pub async fn with_document<F, T>(&self, read: F) -> Result<T, SyncError>
    where
        F: FnOnce(&OfflineDocument) -> T + Send,
    {
        let mut cell = self.inner.lock().await;
        Ok(read(cell.current().await?))
    }

    /// Run a read-modify-validate-persist cycle under the store lock.
    ///
    /// The mutation is applied to a working copy; if it, the schema
    /// validation, or the persistence step fails, both the in-memory and
    /// on-disk document stay at their pre-write state.
    pub(crate) async fn update<F>(&self, mutate: F) -> Result<OfflineDocument, SyncError>
    where
        F: FnOnce(&mut OfflineDocument) -> Result<(), SyncError> + Send,
    {
        let mut cell = self.inner.lock().await;
        let mut candidate = cell.current().await?.clone();
        mutate(&mut candidate)?;
        candidate.validate()?;
        let bytes = candidate.to_bytes()?;
        cell.backend.save(&bytes).await?;
        cell.cached = Some(candidate.clone());
        Ok(candidate)
    }
}
