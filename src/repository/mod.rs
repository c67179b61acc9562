// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Repositories serving the accounting entity family.
//!
//! [`OfflineRepository`] reads the offline document; the failover layer
//! in [`failover`] pairs it with the remote path and handles the sticky
//! online → offline transition.

pub mod failover;
pub mod offline;

pub use failover::FailoverRepository;
pub use offline::OfflineRepository;
