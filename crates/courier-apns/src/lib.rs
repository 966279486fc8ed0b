//! # courier-apns
//!
//! Push delivery to the Apple Push Notification service over one
//! multiplexed HTTP/2 connection per client.
//!
//! - **Credentials**: [`credentials::TokenCredentials`] (cached ES256 bearer
//!   token) and [`credentials::CertificateCredentials`] (TLS client identity)
//! - **Connection**: [`connection::Connection`] seam with the reqwest-backed
//!   [`connection::HttpConnection`]
//! - **Requests**: [`request::build_request`] with push-type inference
//! - **Responses**: [`response::classify`] into [`courier_core::Outcome`]
//! - **Dispatch**: [`client::ApnsClient`] single and batch sends
//! - **Bridge**: [`bridge::Bridge`] for callers without a runtime
//!
//! ## Crate Position
//!
//! Depends on `courier-core` and `courier-settings`. Used by `courier-cli`.

#![deny(unsafe_code)]

pub mod bridge;
pub mod client;
pub mod clock;
pub mod connection;
pub mod credentials;
pub mod endpoint;
pub mod errors;
pub mod request;
pub mod response;

pub use bridge::{Bridge, BridgeOptions, Strategy, select_strategy};
pub use client::{ApnsClient, ApnsClientBuilder};
pub use connection::{Connection, HttpConnection, PushRequest, PushResponse};
pub use credentials::{CertificateCredentials, Credentials, TokenCredentials};
pub use endpoint::Endpoint;
pub use errors::{ApnsError, BridgeError, CredentialsError, TransportError};
