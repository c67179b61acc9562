// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Persistence substrate for the offline document.
//!
//! The store treats the document as raw bytes; parsing and validation
//! live in [`super::document`]. Backends only move bytes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::SyncError;

/// Byte-level access to the durable offline document.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Load the current document bytes. `Ok(None)` means no document has
    /// been materialized yet (first run).
    async fn load(&self) -> Result<Option<Vec<u8>>, SyncError>;

    /// Replace the document bytes. Must be atomic: a failed save leaves
    /// the previous bytes readable.
    async fn save(&self, bytes: &[u8]) -> Result<(), SyncError>;
}

/// File-backed document storage with atomic replace.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn load(&self) -> Result<Option<Vec<u8>>, SyncError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SyncError::system(
                format!("failed to read offline document at {}", self.path.display()),
                err,
            )),
        }
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), SyncError> {
        // Write-then-rename so a crash mid-write never truncates the
        // authoritative document.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(|err| {
            SyncError::system(
                format!("failed to stage offline document at {}", tmp.display()),
                err,
            )
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            SyncError::system(
                format!(
                    "failed to replace offline document at {}",
                    self.path.display()
                ),
                err,
            )
        })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "offline document persisted");
        Ok(())
    }
}

/// In-memory document storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryBackend {
    data: Mutex<Option<Vec<u8>>>,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail, simulating a persistence outage.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Release);
    }

    /// Current stored bytes, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Vec<u8>>, SyncError> {
        Ok(self.data.lock().clone())
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), SyncError> {
        if self.fail_saves.load(Ordering::Acquire) {
            return Err(SyncError::system(
                "failed to persist offline document",
                std::io::Error::other("simulated persistence outage"),
            ));
        }
        *self.data.lock() = Some(bytes.to_vec());
        Ok(())
    }
}
