// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The offline document: a namespaced, schema-validated tree of
//! letterhead and accounting nodes keyed by their `number`.
//!
//! Validation runs on every read and every write. A document that fails
//! it is surfaced as an error, never partially parsed or silently served.
//!
//! Invariants enforced by [`OfflineDocument::validate`]:
//! - fixed namespace and schema version at the root
//! - numbers are unique and strictly positive within each node family
//! - names are non-empty
//! - every accounting's `letter_head_ref` resolves to a letterhead node

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SyncError;
use crate::record::{AccountingRecord, BalanceBelowZeroPolicy, LetterHeadRecord};

/// Fixed namespace of the offline document root.
pub const DOCUMENT_NAMESPACE: &str = "urn:ledger-sync:offline-document";

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// An accounting node as stored in the document. The letterhead is held
/// by reference; [`OfflineDocument::accountings`] resolves it on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingNode {
    pub number: u32,
    pub name: String,
    pub letter_head_ref: u32,
    pub balance_below_zero: BalanceBelowZeroPolicy,
    pub back_dating_window_days: u32,
}

/// Synchronization metadata carried in the same document family, under
/// the same lock as the record nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncData {
    /// Epoch milliseconds of the last successful commit.
    pub last_synced_at: i64,
    /// Number of commits since the document was created.
    pub commits: u64,
}

/// The locally persisted, schema-validated cache of all known
/// accountings and letterheads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineDocument {
    pub namespace: String,
    pub schema_version: u32,
    pub letter_heads: Vec<LetterHeadRecord>,
    pub accountings: Vec<AccountingNode>,
    #[serde(default)]
    pub sync: SyncData,
}

impl OfflineDocument {
    /// A valid document with no records, as materialized on first run.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            namespace: DOCUMENT_NAMESPACE.to_string(),
            schema_version: SCHEMA_VERSION,
            letter_heads: Vec::new(),
            accountings: Vec::new(),
            sync: SyncData::default(),
        }
    }

    /// Parse a document from raw bytes.
    ///
    /// A wire-format parse failure is a system error carrying the parser
    /// error as its cause; a well-formed document that breaks the schema
    /// is a validation error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        let document: Self = serde_json::from_slice(bytes)
            .map_err(|err| SyncError::system("offline document is corrupted", err))?;
        document.validate()?;
        Ok(document)
    }

    /// Serialize the document for persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec_pretty(self)
            .map_err(|err| SyncError::system("offline document could not be serialized", err))
    }

    /// Validate the document against the schema.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.namespace != DOCUMENT_NAMESPACE {
            return Err(SyncError::Validation(format!(
                "offline document namespace mismatch: expected {DOCUMENT_NAMESPACE}, got {}",
                self.namespace
            )));
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(SyncError::Validation(format!(
                "offline document schema version mismatch: expected {SCHEMA_VERSION}, got {}",
                self.schema_version
            )));
        }

        let mut letter_head_numbers = HashSet::new();
        for letter_head in &self.letter_heads {
            if letter_head.number == 0 {
                return Err(SyncError::Validation(
                    "letterhead number must be positive".into(),
                ));
            }
            if letter_head.name.trim().is_empty() {
                return Err(SyncError::Validation(format!(
                    "letterhead {} has an empty name",
                    letter_head.number
                )));
            }
            if !letter_head_numbers.insert(letter_head.number) {
                return Err(SyncError::Validation(format!(
                    "duplicate letterhead number {}",
                    letter_head.number
                )));
            }
        }

        let mut accounting_numbers = HashSet::new();
        for node in &self.accountings {
            if node.number == 0 {
                return Err(SyncError::Validation(
                    "accounting number must be positive".into(),
                ));
            }
            if node.name.trim().is_empty() {
                return Err(SyncError::Validation(format!(
                    "accounting {} has an empty name",
                    node.number
                )));
            }
            if !accounting_numbers.insert(node.number) {
                return Err(SyncError::Validation(format!(
                    "duplicate accounting number {}",
                    node.number
                )));
            }
            if !letter_head_numbers.contains(&node.letter_head_ref) {
                return Err(SyncError::Validation(format!(
                    "accounting {} references missing letterhead {}",
                    node.number, node.letter_head_ref
                )));
            }
        }

        Ok(())
    }

    /// Merge a record into the document.
    ///
    /// Locates or creates the accounting node matching `record.number`
    /// and replaces its attributes. The referenced letterhead node is
    /// created if absent, its name refreshed if present.
    pub fn upsert_accounting(&mut self, record: &AccountingRecord) {
        match self
            .letter_heads
            .iter_mut()
            .find(|lh| lh.number == record.letter_head.number)
        {
            Some(existing) => existing.name = record.letter_head.name.clone(),
            None => self.letter_heads.push(record.letter_head.clone()),
        }

        let node = AccountingNode {
            number: record.number,
            name: record.name.clone(),
            letter_head_ref: record.letter_head.number,
            balance_below_zero: record.balance_below_zero,
            back_dating_window_days: record.back_dating_window_days,
        };
        match self
            .accountings
            .iter_mut()
            .find(|existing| existing.number == record.number)
        {
            Some(existing) => *existing = node,
            None => self.accountings.push(node),
        }
    }

    /// Extract every accounting node with its letterhead reference
    /// resolved, in document order.
    ///
    /// An unresolvable reference is a validation error; it cannot occur
    /// on a document that passed [`validate`](Self::validate).
    pub fn accountings(&self) -> Result<Vec<AccountingRecord>, SyncError> {
        self.accountings
            .iter()
            .map(|node| {
                let letter_head = self
                    .letter_heads
                    .iter()
                    .find(|lh| lh.number == node.letter_head_ref)
                    .cloned()
                    .ok_or_else(|| {
                        SyncError::Validation(format!(
                            "accounting {} references missing letterhead {}",
                            node.number, node.letter_head_ref
                        ))
                    })?;
                Ok(AccountingRecord {
                    number: node.number,
                    name: node.name.clone(),
                    letter_head,
                    balance_below_zero: node.balance_below_zero,
                    back_dating_window_days: node.back_dating_window_days,
                })
            })
            .collect()
    }
}
