//! Request construction: headers, push-type inference and body encoding.

use std::fmt;

use bytes::Bytes;
use courier_core::{DeliveryOptions, Notification, Payload, Priority, PushType};

use crate::connection::PushRequest;
use crate::credentials::Credentials;
use crate::endpoint::Endpoint;
use crate::errors::ApnsError;

/// Turns a payload into the request body.
pub trait BodyEncoder: Send + Sync + fmt::Debug {
    /// Encode `payload`.
    fn encode(&self, payload: &Payload) -> Result<Bytes, ApnsError>;
}

/// Compact JSON with no extra whitespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, payload: &Payload) -> Result<Bytes, ApnsError> {
        serde_json::to_vec(&payload.to_document())
            .map(Bytes::from)
            .map_err(|e| ApnsError::Encode(e.to_string()))
    }
}

/// Push type to send, if any.
///
/// An explicit type always wins. Without one, the topic suffix decides,
/// then whether the payload shows anything to the user. With neither an
/// explicit type nor a topic there is nothing to infer from.
pub fn infer_push_type(
    explicit: Option<PushType>,
    topic: Option<&str>,
    payload: &Payload,
) -> Option<PushType> {
    if explicit.is_some() {
        return explicit;
    }
    let topic = topic?;
    let inferred = if topic.ends_with(".voip") {
        PushType::VoIp
    } else if topic.ends_with(".complication") {
        PushType::Complication
    } else if topic.ends_with(".pushkit.fileprovider") {
        PushType::FileProvider
    } else if payload.is_user_visible() {
        PushType::Alert
    } else {
        PushType::Background
    };
    Some(inferred)
}

/// Build the full request for one notification.
pub fn build_request(
    endpoint: &Endpoint,
    credentials: &dyn Credentials,
    encoder: &dyn BodyEncoder,
    notification: &Notification,
    options: &DeliveryOptions,
) -> Result<PushRequest, ApnsError> {
    let topic = options.topic.as_deref();
    let mut headers: Vec<(&'static str, String)> = Vec::with_capacity(6);

    if let Some(topic) = topic {
        headers.push(("apns-topic", topic.to_string()));
    }
    if let Some(push_type) = infer_push_type(options.push_type, topic, &notification.payload) {
        headers.push(("apns-push-type", push_type.as_str().to_string()));
    }
    if options.priority != Priority::Immediate {
        headers.push(("apns-priority", options.priority.as_header_value().to_string()));
    }
    if let Some(expiration) = options.expiration {
        headers.push(("apns-expiration", expiration.to_string()));
    }
    if let Some(authorization) = credentials.authorization(topic)? {
        headers.push(("authorization", authorization));
    }
    if let Some(ref collapse_id) = options.collapse_id {
        headers.push(("apns-collapse-id", collapse_id.clone()));
    }

    Ok(PushRequest {
        url: endpoint.device_url(&notification.token),
        headers,
        body: encoder.encode(&notification.payload)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
