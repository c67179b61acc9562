// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Ledger Sync
//!
//! Offline-first synchronization and caching core for accounting data.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FailoverRepository                       │
//! │  • Online (initial) → Offline (sticky) state machine       │
//! │  • Connectivity failures flip the switch, nothing else     │
//! └─────────────────────────────────────────────────────────────┘
//!            │ online                          │ offline
//!            ▼                                 ▼
//! ┌─────────────────────────┐      ┌─────────────────────────────┐
//! │    OnlineRepository     │      │     OfflineRepository       │
//! │  • Token via TokenCache │      │  • Locked document read     │
//! │  • One HTTP call per op │      │  • Sorted by number         │
//! │  • Publishes            │─────▶│  • Subscribes to            │
//! │    CollectionReceived   │ bus  │    CollectionReceived       │
//! └─────────────────────────┘      └─────────────────────────────┘
//!                                              │
//!                                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            StructuredStore + DocumentCommitter              │
//! │  • One mutex, whole critical sections                      │
//! │  • Schema-validated on every read and write                │
//! │  • Atomic replace, publishes DocumentUpdated               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ledger_sync::{
//!     DocumentCommitter, EventBus, FailoverRepository, FileBackend, HttpAccountingApi,
//!     HttpTokenSource, OfflineRepository, OnlineRepository, StructuredStore, SyncConfig,
//!     TokenCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ledger_sync::SyncError> {
//!     let config = SyncConfig {
//!         remote_base_url: Some("https://api.example.com".into()),
//!         token_url: Some("https://auth.example.com/token".into()),
//!         client_id: "ledger-client".into(),
//!         client_secret: "secret".into(),
//!         document_path: Some("offline-document.json".into()),
//!         ..Default::default()
//!     };
//!
//!     let bus = EventBus::new(config.event_capacity);
//!     let store = match &config.document_path {
//!         Some(path) => StructuredStore::new(Arc::new(FileBackend::new(path))),
//!         None => StructuredStore::in_memory(),
//!     };
//!     let committer = DocumentCommitter::new(store.clone(), bus.clone());
//!     let offline = OfflineRepository::new(store, committer, &bus);
//!
//!     let tokens = Arc::new(TokenCache::with_margin(
//!         Box::new(HttpTokenSource::from_config(&config)?),
//!         bus.clone(),
//!         config.token_safety_margin(),
//!     ));
//!     let online = OnlineRepository::new(
//!         Arc::new(HttpAccountingApi::from_config(&config)?),
//!         tokens,
//!         bus.clone(),
//!     );
//!
//!     let accountings = FailoverRepository::new(online, offline, bus.clone());
//!     let records = accountings.fetch_all().await?;
//!     println!("{} accountings", records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Behavior
//!
//! - **Failover**: a connectivity failure on the remote path flips the
//!   repository to the offline document; the flag is sticky for the
//!   instance's lifetime, with no automatic recovery probe.
//! - **Token cache**: cached tokens are served while they have more than
//!   the safety margin of validity left; refreshes are single-flight.
//! - **Convergence**: successful remote fetches are announced on the
//!   event bus and merged into the offline document asynchronously.
//! - **Document safety**: one mutex guards the document; every read and
//!   write is schema-validated, and a failed write changes nothing.
//!
//! ## Modules
//!
//! - [`repository`]: failover orchestration and the offline fetch path
//! - [`remote`]: the authenticated online fetch path
//! - [`token`]: access-token cache with expiry-based refresh
//! - [`store`]: the schema-validated offline document and its committer
//! - [`events`]: in-process event bus for sync notifications
//! - [`error`]: the error taxonomy every boundary classifies into

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod record;
pub mod remote;
pub mod repository;
pub mod store;
pub mod token;

pub use config::SyncConfig;
pub use error::SyncError;
pub use events::{EventBus, SyncEvent};
pub use record::{AccessToken, AccountingRecord, BalanceBelowZeroPolicy, LetterHeadRecord};
pub use remote::{AccountingApi, HttpAccountingApi, OnlineRepository};
pub use repository::{FailoverRepository, OfflineRepository};
pub use store::{
    DocumentBackend, DocumentCommitter, FileBackend, MemoryBackend, OfflineDocument,
    StructuredStore, SyncData,
};
pub use token::{HttpTokenSource, TokenCache, TokenSource};
