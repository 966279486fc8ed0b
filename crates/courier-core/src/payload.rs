//! Notification content and its `aps` JSON document.
//!
//! [`Payload::to_document`] produces the nested object sent as the request
//! body. Absent fields never produce keys; boolean flags appear as `1` only
//! when set. Custom keys are merged at the top level after `aps`.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Size ceiling the gateway enforces on encoded bodies. Not checked locally.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Rich alert dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PayloadAlert {
    /// Short title.
    #[serde(skip_serializing_if = "is_blank")]
    pub title: Option<String>,
    /// Localization key for the title.
    #[serde(rename = "title-loc-key", skip_serializing_if = "is_blank")]
    pub title_loc_key: Option<String>,
    /// Format arguments for the title key.
    #[serde(rename = "title-loc-args", skip_serializing_if = "Vec::is_empty")]
    pub title_loc_args: Vec<String>,
    /// Secondary line.
    #[serde(skip_serializing_if = "is_blank")]
    pub subtitle: Option<String>,
    /// Localization key for the subtitle.
    #[serde(rename = "subtitle-loc-key", skip_serializing_if = "is_blank")]
    pub subtitle_loc_key: Option<String>,
    /// Format arguments for the subtitle key.
    #[serde(rename = "subtitle-loc-args", skip_serializing_if = "Vec::is_empty")]
    pub subtitle_loc_args: Vec<String>,
    /// Alert text.
    #[serde(skip_serializing_if = "is_blank")]
    pub body: Option<String>,
    /// Localization key for the body.
    #[serde(rename = "loc-key", skip_serializing_if = "is_blank")]
    pub loc_key: Option<String>,
    /// Format arguments for the body key.
    #[serde(rename = "loc-args", skip_serializing_if = "Vec::is_empty")]
    pub loc_args: Vec<String>,
    /// Localization key for the action button.
    #[serde(rename = "action-loc-key", skip_serializing_if = "is_blank")]
    pub action_loc_key: Option<String>,
    /// Action button label.
    #[serde(skip_serializing_if = "is_blank")]
    pub action: Option<String>,
    /// Launch image file name.
    #[serde(rename = "launch-image", skip_serializing_if = "is_blank")]
    pub launch_image: Option<String>,
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// The `alert` entry: plain text or a rich dictionary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Alert {
    /// Plain alert string.
    Text(String),
    /// Structured alert.
    Rich(PayloadAlert),
}

impl From<&str> for Alert {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Alert {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PayloadAlert> for Alert {
    fn from(alert: PayloadAlert) -> Self {
        Self::Rich(alert)
    }
}

/// Notification content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    /// Alert text or dictionary.
    pub alert: Option<Alert>,
    /// Badge number. `Some(0)` clears the badge.
    pub badge: Option<u32>,
    /// Sound file name.
    pub sound: Option<String>,
    /// Notification category identifier.
    pub category: Option<String>,
    /// Thread identifier used for grouping.
    pub thread_id: Option<String>,
    /// Safari push URL arguments.
    pub url_args: Option<Vec<String>>,
    /// Wake the app for a background fetch.
    pub content_available: bool,
    /// Let a service extension modify the content.
    pub mutable_content: bool,
    /// Extra top-level keys.
    pub custom: Map<String, Value>,
}

impl Payload {
    /// Payload with a plain or rich alert.
    pub fn alert(alert: impl Into<Alert>) -> Self {
        Self {
            alert: Some(alert.into()),
            ..Self::default()
        }
    }

    /// Silent payload that only sets `content-available`.
    pub fn background() -> Self {
        Self {
            content_available: true,
            ..Self::default()
        }
    }

    /// Set the badge.
    #[must_use]
    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Set the sound.
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Set the thread identifier.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Add a custom top-level key.
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: Value) -> Self {
        let _ = self.custom.insert(key.into(), value);
        self
    }

    /// Whether the payload asks the device to show something to the user.
    ///
    /// Drives push-type inference: visible content means `alert`.
    pub fn is_user_visible(&self) -> bool {
        self.alert.is_some() || self.badge.is_some() || self.sound.is_some()
    }

    /// Build the JSON document sent as the request body.
    pub fn to_document(&self) -> Value {
        let mut aps = Map::new();

        if let Some(ref alert) = self.alert {
            let value = match alert {
                Alert::Text(text) => Value::String(text.clone()),
                Alert::Rich(rich) => serde_json::to_value(rich).unwrap_or_default(),
            };
            let _ = aps.insert("alert".into(), value);
        }
        if let Some(badge) = self.badge {
            let _ = aps.insert("badge".into(), Value::from(badge));
        }
        if let Some(ref sound) = self.sound {
            let _ = aps.insert("sound".into(), Value::String(sound.clone()));
        }
        if self.content_available {
            let _ = aps.insert("content-available".into(), Value::from(1));
        }
        if self.mutable_content {
            let _ = aps.insert("mutable-content".into(), Value::from(1));
        }
        if let Some(ref thread_id) = self.thread_id {
            let _ = aps.insert("thread-id".into(), Value::String(thread_id.clone()));
        }
        if let Some(ref category) = self.category {
            let _ = aps.insert("category".into(), Value::String(category.clone()));
        }
        if let Some(ref url_args) = self.url_args {
            let _ = aps.insert("url-args".into(), Value::from(url_args.clone()));
        }

        let mut document = Map::new();
        let _ = document.insert("aps".into(), Value::Object(aps));
        for (key, value) in &self.custom {
            let _ = document.insert(key.clone(), value.clone());
        }
        Value::Object(document)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_alert() -> PayloadAlert {
        PayloadAlert {
            title: Some("title".into()),
            title_loc_key: Some("title_loc_k".into()),
            title_loc_args: vec!["title_loc_a".into()],
            subtitle: Some("subtitle".into()),
            subtitle_loc_key: Some("subtitle_loc_k".into()),
            subtitle_loc_args: vec!["subtitle_loc_a".into()],
            body: Some("body".into()),
            loc_key: Some("body_loc_k".into()),
            loc_args: vec!["body_loc_a".into()],
            action_loc_key: Some("ac_loc_k".into()),
            action: Some("send".into()),
            launch_image: Some("img".into()),
        }
    }

    fn full_alert_json() -> Value {
        json!({
            "title": "title",
            "title-loc-key": "title_loc_k",
            "title-loc-args": ["title_loc_a"],
            "subtitle": "subtitle",
            "subtitle-loc-key": "subtitle_loc_k",
            "subtitle-loc-args": ["subtitle_loc_a"],
            "body": "body",
            "loc-key": "body_loc_k",
            "loc-args": ["body_loc_a"],
            "action-loc-key": "ac_loc_k",
            "action": "send",
            "launch-image": "img",
        })
    }

    #[test]
    fn rich_alert_full() {
        assert_eq!(serde_json::to_value(full_alert()).unwrap(), full_alert_json());
    }

    #[test]
    fn rich_alert_empty_and_blank_fields_are_omitted() {
        assert_eq!(serde_json::to_value(PayloadAlert::default()).unwrap(), json!({}));
        let alert = PayloadAlert {
            title: Some(String::new()),
            body: Some("Simple message".into()),
            ..PayloadAlert::default()
        };
        assert_eq!(
            serde_json::to_value(alert).unwrap(),
            json!({"body": "Simple message"})
        );
    }

    #[test]
    fn full_payload_document() {
        let payload = Payload {
            alert: Some("my_alert".into()),
            badge: Some(2),
            sound: Some("chime".into()),
            category: Some("my_category".into()),
            thread_id: Some("42".into()),
            url_args: Some(vec!["args".into()]),
            content_available: true,
            mutable_content: true,
            custom: Map::new(),
        }
        .with_custom("extra", json!("something"));

        assert_eq!(
            payload.to_document(),
            json!({
                "aps": {
                    "alert": "my_alert",
                    "badge": 2,
                    "sound": "chime",
                    "content-available": 1,
                    "mutable-content": 1,
                    "category": "my_category",
                    "url-args": ["args"],
                    "thread-id": "42",
                },
                "extra": "something",
            })
        );
    }

    #[test]
    fn empty_payload_is_empty_aps() {
        assert_eq!(Payload::default().to_document(), json!({"aps": {}}));
    }

    #[test]
    fn badge_zero_is_kept() {
        assert_eq!(
            Payload::default().with_badge(0).to_document(),
            json!({"aps": {"badge": 0}})
        );
    }

    #[test]
    fn background_only() {
        assert_eq!(
            Payload::background().to_document(),
            json!({"aps": {"content-available": 1}})
        );
    }

    #[test]
    fn rich_alert_nested_under_aps() {
        let payload = Payload::alert(full_alert());
        assert_eq!(payload.to_document(), json!({"aps": {"alert": full_alert_json()}}));
    }

    #[test]
    fn custom_nested_data_is_merged() {
        let user_info = json!({"user_id": 12345, "preferences": ["pref1", "pref2"]});
        let doc = Payload::alert("You have a new message")
            .with_badge(1)
            .with_custom("user_info", user_info.clone())
            .to_document();
        assert_eq!(doc["aps"]["alert"], "You have a new message");
        assert_eq!(doc["aps"]["badge"], 1);
        assert_eq!(doc["user_info"], user_info);
    }

    #[test]
    fn serialize_matches_document() {
        let payload = Payload::alert("hi").with_sound("default");
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"aps":{"alert":"hi","sound":"default"}}"#
        );
    }

    #[test]
    fn large_alert_stays_under_limit() {
        let payload = Payload::alert("x".repeat(3000)).with_custom("data", json!("small"));
        let encoded = serde_json::to_vec(&payload).unwrap();
        assert!(encoded.len() < MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn visibility_drives_from_alert_badge_sound() {
        assert!(Payload::alert("x").is_user_visible());
        assert!(Payload::default().with_badge(3).is_user_visible());
        assert!(Payload::default().with_sound("a.caf").is_user_visible());
        assert!(!Payload::background().is_user_visible());
        assert!(!Payload::default().with_thread_id("t").is_user_visible());
    }
}
