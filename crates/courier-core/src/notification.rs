//! Notification and per-call delivery options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::payload::Payload;

/// One delivery attempt: a device token and the content to show on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// Hex device token identifying the target device.
    pub token: String,
    /// Content document sent as the request body.
    pub payload: Payload,
}

impl Notification {
    /// Create a notification for `token`.
    pub fn new(token: impl Into<String>, payload: Payload) -> Self {
        Self {
            token: token.into(),
            payload,
        }
    }
}

/// Delivery priority (`apns-priority`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Deliver now (`10`). Gateway default.
    #[default]
    Immediate,
    /// Deliver when power conditions allow (`5`).
    Delayed,
}

impl Priority {
    /// Header value for this priority.
    pub fn as_header_value(self) -> &'static str {
        match self {
            Self::Immediate => "10",
            Self::Delayed => "5",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "immediate" | "high" | "10" => Ok(Self::Immediate),
            "delayed" | "normal" | "5" => Ok(Self::Delayed),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Push type (`apns-push-type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    /// User-visible alert, sound or badge.
    Alert,
    /// Silent content update.
    Background,
    /// `PushKit` `VoIP` call.
    #[serde(rename = "voip")]
    VoIp,
    /// watchOS complication update.
    Complication,
    /// File provider change signal.
    #[serde(rename = "fileprovider")]
    FileProvider,
    /// Device management wake-up.
    Mdm,
}

impl PushType {
    /// Header value for this push type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
            Self::VoIp => "voip",
            Self::Complication => "complication",
            Self::FileProvider => "fileprovider",
            Self::Mdm => "mdm",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alert" => Ok(Self::Alert),
            "background" => Ok(Self::Background),
            "voip" => Ok(Self::VoIp),
            "complication" => Ok(Self::Complication),
            "fileprovider" => Ok(Self::FileProvider),
            "mdm" => Ok(Self::Mdm),
            other => Err(format!("unknown push type: {other}")),
        }
    }
}

/// Per-call delivery options. Not stored by the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Routing scope (`apns-topic`), normally the app bundle id.
    pub topic: Option<String>,
    /// Delivery priority.
    pub priority: Priority,
    /// Expiration as epoch seconds. `None` leaves the gateway default.
    pub expiration: Option<i64>,
    /// Collapse identifier (`apns-collapse-id`).
    pub collapse_id: Option<String>,
    /// Explicit push type. Overrides inference when set.
    pub push_type: Option<PushType>,
}

impl DeliveryOptions {
    /// Options routed to `topic` with all other fields at their defaults.
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the expiration (epoch seconds).
    #[must_use]
    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the collapse identifier.
    #[must_use]
    pub fn with_collapse_id(mut self, collapse_id: impl Into<String>) -> Self {
        self.collapse_id = Some(collapse_id.into());
        self
    }

    /// Set an explicit push type.
    #[must_use]
    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.push_type = Some(push_type);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
