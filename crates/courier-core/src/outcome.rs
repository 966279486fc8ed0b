//! Per-notification delivery outcome.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of delivering one notification.
///
/// Closed taxonomy: callers can match exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// Accepted by the gateway.
    Success,
    /// Declined by the gateway. Not retried.
    Rejected {
        /// Gateway reason string, e.g. `BadDeviceToken`.
        reason: String,
    },
    /// The token is no longer valid; stop sending to it.
    Gone {
        /// Gateway reason string, normally `Unregistered`.
        reason: String,
        /// When the token became invalid, as reported by the gateway.
        timestamp: String,
    },
    /// Transport failure or unreadable response.
    InternalError,
}

impl Outcome {
    /// Whether the notification was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the caller should drop the token.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Rejected { reason } => write!(f, "Rejected({reason})"),
            Self::Gone { reason, timestamp } => write!(f, "Gone({reason}, {timestamp})"),
            Self::InternalError => f.write_str("InternalError"),
        }
    }
}

/// Outcomes keyed by device token.
///
/// One entry per distinct token; a repeated token keeps the outcome of its
/// last occurrence in the input.
pub type BatchResult = HashMap<String, Outcome>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn predicates() {
        assert!(Outcome::Success.is_success());
        assert!(!Outcome::InternalError.is_success());
        let gone = Outcome::Gone {
            reason: "Unregistered".into(),
            timestamp: "1".into(),
        };
        assert!(gone.is_gone());
        assert!(!gone.is_success());
    }

    #[test]
    fn display() {
        assert_eq!(Outcome::Success.to_string(), "Success");
        assert_eq!(
            Outcome::Rejected {
                reason: "BadDeviceToken".into()
            }
            .to_string(),
            "Rejected(BadDeviceToken)"
        );
        assert_eq!(Outcome::InternalError.to_string(), "InternalError");
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::Gone {
            reason: "Unregistered".into(),
            timestamp: "1234567890".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "gone", "reason": "Unregistered", "timestamp": "1234567890"})
        );
        let back: Outcome = serde_json::from_value(serde_json::json!({"status": "success"})).unwrap();
        assert_matches!(back, Outcome::Success);
    }
}
