//! # courier-core
//!
//! Shared vocabulary for the Courier push client.
//!
//! - **Notifications**: [`notification::Notification`] plus per-call
//!   [`notification::DeliveryOptions`], [`notification::Priority`], [`notification::PushType`]
//! - **Payload**: [`payload::Payload`] and the `aps` document it serializes to
//! - **Outcomes**: [`outcome::Outcome`] taxonomy and [`outcome::BatchResult`]
//! - **Logging**: [`logging::init_subscriber`] for binaries
//! - **Text**: token-safe truncation for log fields
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `courier-apns` and `courier-cli`.

#![deny(unsafe_code)]

pub mod logging;
pub mod notification;
pub mod outcome;
pub mod payload;
pub mod text;

pub use notification::{DeliveryOptions, Notification, Priority, PushType};
pub use outcome::{BatchResult, Outcome};
pub use payload::{Alert, MAX_PAYLOAD_SIZE, Payload, PayloadAlert};
