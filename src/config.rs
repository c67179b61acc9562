// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the sync core.
//!
//! # Example
//!
//! ```
//! use ledger_sync::SyncConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SyncConfig::default();
//! assert_eq!(config.token_safety_margin_secs, 60);
//!
//! // Full config
//! let config = SyncConfig {
//!     remote_base_url: Some("https://api.example.com".into()),
//!     token_url: Some("https://auth.example.com/token".into()),
//!     client_id: "ledger-client".into(),
//!     client_secret: "secret".into(),
//!     document_path: Some("offline-document.json".into()),
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Configuration for the sync core.
///
/// All fields have defaults. For production use, configure
/// `remote_base_url`, `token_url`, the client credentials, and
/// `document_path`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote accounting service.
    #[serde(default)]
    pub remote_base_url: Option<String>,

    /// URL of the token endpoint.
    #[serde(default)]
    pub token_url: Option<String>,

    /// Client credentials presented to the token endpoint.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,

    /// Path of the offline document. `None` keeps the document in memory
    /// only (useful for tests and ephemeral sessions).
    #[serde(default)]
    pub document_path: Option<String>,

    /// HTTP timeout for remote calls in milliseconds (default: 10 s).
    /// A timed-out call is classified as a connectivity failure.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Seconds of remaining validity below which a cached token is
    /// refreshed instead of served (default: 60 s).
    #[serde(default = "default_token_safety_margin_secs")]
    pub token_safety_margin_secs: u64,

    /// Per-subscriber event buffer before lagging drops old events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_http_timeout_ms() -> u64 {
    10_000
}
fn default_token_safety_margin_secs() -> u64 {
    60
}
fn default_event_capacity() -> usize {
    64
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_base_url: None,
            token_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            document_path: None,
            http_timeout_ms: default_http_timeout_ms(),
            token_safety_margin_secs: default_token_safety_margin_secs(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SyncConfig {
    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Token safety margin as a [`Duration`].
    #[must_use]
    pub fn token_safety_margin(&self) -> Duration {
        Duration::from_secs(self.token_safety_margin_secs)
    }
}
