// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error taxonomy for the sync core.
//!
//! Every boundary (HTTP client, document parser, persistence backend) maps
//! its low-level failures into exactly one [`SyncError`] kind at the point
//! of catch. Higher layers never inspect transport or parser detail; the
//! failover decision is a single call to [`SyncError::is_connectivity`].
//!
//! Kinds:
//! - `Connectivity`: the remote service could not be reached. The only kind
//!   that drives the online → offline transition.
//! - `Unauthorized`: credentials rejected (401/403). Never triggers failover.
//! - `Validation`: the request was semantically invalid, or the offline
//!   document failed schema validation. Message is user-facing.
//! - `System`: malformed response, server error, or a corrupted document.
//!   Carries the low-level cause for diagnostics, not for display.
//! - `Contract`: an invalid argument to a core operation. Fatal to the
//!   call, never retried, never classified as offline.

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed low-level cause attached to classified errors.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified error returned from every core operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote service unreachable (name resolution, refused connection,
    /// timeout). Drives the online → offline transition.
    #[error("remote service unreachable")]
    Connectivity {
        #[source]
        source: Cause,
    },

    /// Remote service rejected the credentials (401/403-equivalent).
    #[error("remote service rejected credentials (status {status})")]
    Unauthorized { status: u16, message: String },

    /// Semantically invalid request or offline document. The message is
    /// meant to reach the UI verbatim.
    #[error("{0}")]
    Validation(String),

    /// Internal defect or environment problem: malformed response,
    /// unexpected server error, corrupted offline document.
    #[error("{context}")]
    System {
        context: String,
        #[source]
        source: Cause,
    },

    /// Invalid argument to a core operation.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl SyncError {
    /// Wrap a transport-level cause as a connectivity failure.
    pub fn connectivity(source: impl Into<Cause>) -> Self {
        Self::Connectivity {
            source: source.into(),
        }
    }

    /// Wrap a low-level cause as a system failure with context.
    pub fn system(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::System {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether this error marks the remote service as unreachable.
    ///
    /// This is the only predicate the failover layer branches on.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Label for metrics/log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "connectivity",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Validation(_) => "validation",
            Self::System { .. } => "system",
            Self::Contract(_) => "contract",
        }
    }

    /// Classify a transport failure from the HTTP client.
    ///
    /// Only connection and timeout failures are connectivity; everything
    /// else (request construction, body decode, protocol defects) is a
    /// system failure. A defective request must not flip the system
    /// offline.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::connectivity(err)
        } else {
            Self::system("remote call failed", err)
        }
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized {
                status: status.as_u16(),
                message: body,
            },
            StatusCode::BAD_REQUEST => Self::Validation(body),
            _ => Self::System {
                context: format!("remote service error (status {})", status.as_u16()),
                source: Box::new(RemoteStatus {
                    status: status.as_u16(),
                    body,
                }),
            },
        }
    }
}

/// Low-level cause attached to unexpected remote statuses.
#[derive(Debug, Error)]
#[error("status {status}: {body}")]
pub struct RemoteStatus {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_predicate() {
        let err = SyncError::connectivity(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(err.is_connectivity());
        assert_eq!(err.kind(), "connectivity");
    }

    #[test]
    fn test_other_kinds_are_not_connectivity() {
        let errors = [
            SyncError::Unauthorized {
                status: 401,
                message: "nope".into(),
            },
            SyncError::Validation("bad input".into()),
            SyncError::system("boom", std::io::Error::other("cause")),
            SyncError::Contract("null entity".into()),
        ];
        for err in errors {
            assert!(!err.is_connectivity(), "{} must not fail over", err.kind());
        }
    }

    #[test]
    fn test_malformed_request_is_not_connectivity() {
        // Fails at request construction, before any network activity.
        let err = reqwest::Client::new()
            .get("http://[not-a-host")
            .build()
            .unwrap_err();
        let classified = SyncError::from_transport(err);
        assert!(!classified.is_connectivity());
        assert!(matches!(classified, SyncError::System { .. }));
    }

    #[test]
    fn test_status_classification() {
        let unauthorized = SyncError::from_status(StatusCode::UNAUTHORIZED, "denied".into());
        assert!(matches!(
            unauthorized,
            SyncError::Unauthorized { status: 401, .. }
        ));

        let forbidden = SyncError::from_status(StatusCode::FORBIDDEN, "denied".into());
        assert!(matches!(
            forbidden,
            SyncError::Unauthorized { status: 403, .. }
        ));

        let bad_request = SyncError::from_status(StatusCode::BAD_REQUEST, "missing field".into());
        assert!(matches!(bad_request, SyncError::Validation(ref m) if m == "missing field"));

        let server = SyncError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "oops".into());
        assert!(matches!(server, SyncError::System { .. }));
    }

    #[test]
    fn test_system_error_carries_cause() {
        let err = SyncError::from_status(StatusCode::BAD_GATEWAY, "upstream down".into());
        let source = std::error::Error::source(&err).expect("system errors carry a cause");
        assert!(source.to_string().contains("upstream down"));
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = SyncError::Validation("accounting name must not be empty".into());
        assert_eq!(err.to_string(), "accounting name must not be empty");
    }
}
