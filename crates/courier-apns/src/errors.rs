//! Error types for credentials, transport, bridging, and the client.
//!
//! Per-notification gateway rejections are not errors; they are
//! [`courier_core::Outcome`] values. These types cover failures that
//! prevent an outcome from being produced at all.

use std::time::Duration;

use thiserror::Error;

/// Credential construction or signing failures.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Failed to read a key or certificate file.
    #[error("failed to read credential file at {path}: {reason}")]
    KeyRead {
        /// File path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// Failed to parse the signing key.
    #[error("failed to parse signing key: {reason}")]
    KeyParse {
        /// Error description.
        reason: String,
    },
    /// Failed to build a TLS identity from the certificate bundle.
    #[error("invalid certificate bundle: {reason}")]
    Identity {
        /// Error description.
        reason: String,
    },
    /// The certificate key is encrypted and no password was given.
    #[error("certificate key is encrypted but no password was configured")]
    PasswordRequired,
    /// The encrypted certificate key could not be decrypted.
    #[error("failed to decrypt certificate key: {reason}")]
    KeyDecrypt {
        /// Error description.
        reason: String,
    },
    /// Required configuration is missing.
    #[error("missing credential setting: {0}")]
    Missing(&'static str),
    /// Failed to sign a token.
    #[error("failed to sign token: {reason}")]
    Sign {
        /// Error description.
        reason: String,
    },
}

/// Failures of a single request/response exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request failed on the wire (connect, TLS, stream reset, timeout).
    #[error("request failed: {0}")]
    Request(String),
    /// Response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
    /// No stream slot became free within the pool timeout.
    #[error("no stream slot available after {0:?}")]
    PoolTimeout(Duration),
    /// The transport could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Failures of the blocking bridge itself.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A runtime could not be created or driven.
    #[error("runtime lifecycle error: {0}")]
    Runtime(String),
    /// The worker thread did not finish in time. The work keeps running.
    #[error("async operation timed out after {0:?}")]
    Timeout(Duration),
    /// The operation panicked on the worker thread.
    #[error("async operation panicked: {0}")]
    Panicked(String),
    /// The worker exited without reporting anything.
    #[error("failed to get result from async operation")]
    NoResult,
    /// The worker thread could not be spawned.
    #[error("failed to spawn bridge thread: {0}")]
    Spawn(String),
}

/// Errors surfaced to client callers.
#[derive(Debug, Error)]
pub enum ApnsError {
    /// Credential failure.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    /// Transport failure on a single send.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(String),
    /// The blocking bridge failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ApnsError>;
