// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Domain records exchanged between the remote service, the offline
//! document, and the application layer.
//!
//! [`AccountingRecord`] identity is its `number`; records are replaced,
//! not mutated, on every sync. [`AccessToken`] is an immutable value
//! superseded on refresh, never updated in place.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncError;

/// Epoch milliseconds, the timestamp representation used throughout.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// How an accounting treats a balance below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceBelowZeroPolicy {
    /// No special treatment.
    #[default]
    None,
    /// Negative balances post to the debit side.
    Debit,
    /// Negative balances post to the credit side.
    Credit,
}

/// Identification record referenced by accountings for document
/// presentation purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterHeadRecord {
    pub number: u32,
    pub name: String,
}

/// A financial ledger entity identified by a unique number.
///
/// Created and updated only through the document committer; read-only to
/// every other component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingRecord {
    /// Unique identity, strictly positive.
    pub number: u32,
    pub name: String,
    /// The letterhead this accounting presents with.
    pub letter_head: LetterHeadRecord,
    pub balance_below_zero: BalanceBelowZeroPolicy,
    /// Days a posting may be dated in the past relative to today.
    pub back_dating_window_days: u32,
}

impl AccountingRecord {
    /// Argument-level checks applied before a record enters the core.
    ///
    /// Violations are programming-contract failures, not user-facing
    /// validation: callers must never hand the core a record like this.
    pub fn check_contract(&self) -> Result<(), SyncError> {
        if self.number == 0 {
            return Err(SyncError::Contract(
                "accounting number must be positive".into(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(SyncError::Contract("accounting name must not be empty".into()));
        }
        if self.letter_head.number == 0 {
            return Err(SyncError::Contract(
                "letterhead number must be positive".into(),
            ));
        }
        if self.letter_head.name.trim().is_empty() {
            return Err(SyncError::Contract("letterhead name must not be empty".into()));
        }
        Ok(())
    }
}

/// Immutable bearer credential obtained from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token_type: String,
    pub token_value: String,
    /// Expiry as epoch milliseconds.
    pub expires_at: i64,
}

impl AccessToken {
    /// Build a token expiring `expires_in` from now, as returned by the
    /// token endpoint.
    #[must_use]
    pub fn expiring_in(token_type: String, token_value: String, expires_in: Duration) -> Self {
        Self {
            token_type,
            token_value,
            expires_at: now_millis() + expires_in.as_millis() as i64,
        }
    }

    /// Whether the token is still valid with at least `margin` to spare.
    #[must_use]
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_at - now_millis() > margin.as_millis() as i64
    }

    /// `Authorization` header value for remote calls.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record(number: u32, name: &str) -> AccountingRecord {
        AccountingRecord {
            number,
            name: name.to_string(),
            letter_head: LetterHeadRecord {
                number: 1,
                name: "Main office".to_string(),
            },
            balance_below_zero: BalanceBelowZeroPolicy::None,
            back_dating_window_days: 30,
        }
    }

    #[test]
    fn test_contract_accepts_valid_record() {
        assert!(test_record(1, "Cash").check_contract().is_ok());
    }

    #[test]
    fn test_contract_rejects_zero_number() {
        let record = test_record(0, "Cash");
        let err = record.check_contract().unwrap_err();
        assert!(matches!(err, SyncError::Contract(_)));
    }

    #[test]
    fn test_contract_rejects_blank_name() {
        let record = test_record(1, "   ");
        assert!(matches!(
            record.check_contract(),
            Err(SyncError::Contract(_))
        ));
    }

    #[test]
    fn test_contract_rejects_invalid_letterhead() {
        let mut record = test_record(1, "Cash");
        record.letter_head.number = 0;
        assert!(record.check_contract().is_err());

        let mut record = test_record(1, "Cash");
        record.letter_head.name.clear();
        assert!(record.check_contract().is_err());
    }

    #[test]
    fn test_token_freshness() {
        let fresh = AccessToken::expiring_in(
            "Bearer".into(),
            "abc".into(),
            Duration::from_secs(3600),
        );
        assert!(fresh.is_fresh(Duration::from_secs(60)));

        let expiring = AccessToken::expiring_in(
            "Bearer".into(),
            "abc".into(),
            Duration::from_secs(30),
        );
        assert!(!expiring.is_fresh(Duration::from_secs(60)));

        let expired = AccessToken {
            token_type: "Bearer".into(),
            token_value: "abc".into(),
            expires_at: now_millis() - 1_000,
        };
        assert!(!expired.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_authorization_header() {
        let token = AccessToken::expiring_in(
            "Bearer".into(),
            "secret-token".into(),
            Duration::from_secs(60),
        );
        assert_eq!(token.authorization(), "Bearer secret-token");
    }

    #[test]
    fn test_policy_serde_round_trip() {
        let record = test_record(7, "Bank");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"balance_below_zero\":\"none\""));

        let back: AccountingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_policy_default() {
        assert_eq!(
            BalanceBelowZeroPolicy::default(),
            BalanceBelowZeroPolicy::None
        );
    }
}
