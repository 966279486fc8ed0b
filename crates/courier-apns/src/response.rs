//! Response classification.

use courier_core::Outcome;
use serde_json::{Map, Value};

use crate::connection::PushResponse;

/// Status for an accepted notification.
const STATUS_OK: u16 = 200;
/// Status for a token that is no longer active.
const STATUS_GONE: u16 = 410;

/// Map a response to its outcome.
///
/// Never fails: a body that cannot be read as a JSON object, or a
/// rejection without a reason, is an [`Outcome::InternalError`].
pub fn classify(response: &PushResponse) -> Outcome {
    if response.status == STATUS_OK {
        return Outcome::Success;
    }

    let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(&response.body) else {
        return Outcome::InternalError;
    };

    if response.status == STATUS_GONE {
        return Outcome::Gone {
            reason: field_text(&body, "reason").unwrap_or_else(|| "Unregistered".to_string()),
            timestamp: field_text(&body, "timestamp").unwrap_or_default(),
        };
    }

    match field_text(&body, "reason") {
        Some(reason) => Outcome::Rejected { reason },
        None => Outcome::InternalError,
    }
}

/// Field as text; numbers and other scalars are rendered, `null` is absent.
fn field_text(body: &Map<String, Value>, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
