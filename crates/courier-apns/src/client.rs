//! Push client: single and batch dispatch over one shared connection.
//!
//! A batch fans out as concurrent requests on the client's single
//! [`Connection`]; reqwest multiplexes them as HTTP/2 streams. Each
//! stream's failure is isolated to that token's [`Outcome`]. Single sends
//! are not isolated: transport failures come back as errors.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use courier_core::text::token_prefix;
use courier_core::{BatchResult, DeliveryOptions, Notification, Outcome, Payload};
use courier_settings::{ApnsEnvironment, ConnectionSettings, CourierSettings};
use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, BridgeOptions};
use crate::connection::{Connection, HttpConnection, PushRequest};
use crate::credentials::{self, Credentials};
use crate::endpoint::Endpoint;
use crate::errors::{ApnsError, Result, TransportError};
use crate::request::{BodyEncoder, JsonBodyEncoder, build_request};
use crate::response::classify;

struct Inner {
    credentials: Arc<dyn Credentials>,
    connection: Arc<dyn Connection>,
    endpoint: Endpoint,
    encoder: Arc<dyn BodyEncoder>,
    bridge: Bridge,
}

/// Push client. Cheap to clone; clones share the connection and
/// credentials.
#[derive(Clone)]
pub struct ApnsClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for ApnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApnsClient")
            .field("endpoint", &self.inner.endpoint)
            .field("credentials", &self.inner.credentials)
            .field("bridge", &self.inner.bridge)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApnsClient`].
pub struct ApnsClientBuilder {
    credentials: Arc<dyn Credentials>,
    sandbox: bool,
    alternative_port: bool,
    connection_settings: ConnectionSettings,
    connection: Option<Arc<dyn Connection>>,
    encoder: Arc<dyn BodyEncoder>,
    bridge: BridgeOptions,
}

impl fmt::Debug for ApnsClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApnsClientBuilder")
            .field("sandbox", &self.sandbox)
            .field("alternative_port", &self.alternative_port)
            .field("connection_settings", &self.connection_settings)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl ApnsClientBuilder {
    /// Use the development gateway.
    #[must_use]
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Use port 2197.
    #[must_use]
    pub fn alternative_port(mut self, alternative_port: bool) -> Self {
        self.alternative_port = alternative_port;
        self
    }

    /// Transport limits, timeouts and proxy.
    #[must_use]
    pub fn connection_settings(mut self, settings: ConnectionSettings) -> Self {
        self.connection_settings = settings;
        self
    }

    /// Use `connection` instead of building an HTTP connection.
    #[must_use]
    pub fn connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Custom body encoding.
    #[must_use]
    pub fn body_encoder(mut self, encoder: Arc<dyn BodyEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Blocking bridge options.
    #[must_use]
    pub fn bridge(mut self, options: BridgeOptions) -> Self {
        self.bridge = options;
        self
    }

    /// Build the client, creating its connection.
    pub fn build(self) -> Result<ApnsClient> {
        let endpoint = Endpoint::new(self.sandbox, self.alternative_port);
        let connection = match self.connection {
            Some(connection) => connection,
            None => {
                let identity = self.credentials.connection_identity()?;
                Arc::new(HttpConnection::new(&self.connection_settings, identity)?)
            }
        };

        info!(
            endpoint = %endpoint,
            max_streams = self.connection_settings.max_concurrent_streams,
            force_isolation = self.bridge.force_thread_isolation,
            "push client initialized"
        );

        Ok(ApnsClient {
            inner: Arc::new(Inner {
                credentials: self.credentials,
                connection,
                endpoint,
                encoder: self.encoder,
                bridge: Bridge::new(self.bridge),
            }),
        })
    }
}

impl ApnsClient {
    /// Start building a client authenticated by `credentials`.
    pub fn builder(credentials: Arc<dyn Credentials>) -> ApnsClientBuilder {
        ApnsClientBuilder {
            credentials,
            sandbox: false,
            alternative_port: false,
            connection_settings: ConnectionSettings::default(),
            connection: None,
            encoder: Arc::new(JsonBodyEncoder),
            bridge: BridgeOptions::default(),
        }
    }

    /// Build credentials, connection and bridge from settings.
    pub fn from_settings(settings: &CourierSettings) -> Result<Self> {
        let credentials = credentials::from_settings(&settings.apns.credentials)?;
        Self::builder(credentials)
            .sandbox(settings.apns.environment == ApnsEnvironment::Sandbox)
            .alternative_port(settings.apns.use_alternative_port)
            .connection_settings(settings.connection.clone())
            .bridge(BridgeOptions::from_settings(&settings.bridge))
            .build()
    }

    /// Client over an existing connection, with default encoding and bridge.
    pub fn with_connection(
        credentials: Arc<dyn Credentials>,
        connection: Arc<dyn Connection>,
        endpoint: Endpoint,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                credentials,
                connection,
                endpoint,
                encoder: Arc::new(JsonBodyEncoder),
                bridge: Bridge::default(),
            }),
        }
    }

    /// Gateway this client sends to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Bridge used by the blocking methods.
    pub fn bridge(&self) -> Bridge {
        self.inner.bridge
    }

    fn build(&self, notification: &Notification, options: &DeliveryOptions) -> Result<PushRequest> {
        build_request(
            &self.inner.endpoint,
            self.inner.credentials.as_ref(),
            self.inner.encoder.as_ref(),
            notification,
            options,
        )
    }

    async fn dispatch(&self, request: PushRequest) -> std::result::Result<Outcome, TransportError> {
        let response = self.inner.connection.post(request).await?;
        let outcome = classify(&response);
        debug!(status = response.status, apns_id = ?response.apns_id, %outcome, "push response");
        Ok(outcome)
    }

    /// Send one notification.
    ///
    /// Transport failures and credential errors are returned as errors;
    /// gateway rejections are outcomes.
    pub async fn send(
        &self,
        token: impl Into<String>,
        payload: Payload,
        options: &DeliveryOptions,
    ) -> Result<Outcome> {
        self.send_notification(&Notification::new(token, payload), options)
            .await
    }

    /// Send an already-built notification.
    pub async fn send_notification(
        &self,
        notification: &Notification,
        options: &DeliveryOptions,
    ) -> Result<Outcome> {
        let request = self.build(notification, options)?;
        debug!(
            token_prefix = token_prefix(&notification.token),
            topic = ?options.topic,
            "push request"
        );

        let outcome = self.dispatch(request).await.map_err(|e| {
            warn!(
                token_prefix = token_prefix(&notification.token),
                error = %e,
                "push send failed"
            );
            ApnsError::from(e)
        })?;

        if outcome.is_success() {
            info!(token_prefix = token_prefix(&notification.token), "push sent");
        } else {
            warn!(
                token_prefix = token_prefix(&notification.token),
                outcome = %outcome,
                "push not delivered"
            );
        }
        Ok(outcome)
    }

    /// Send every notification concurrently and collect one outcome per
    /// distinct token.
    ///
    /// Never fails as a whole: a request that cannot be built, a transport
    /// error, or a panic inside one stream becomes
    /// [`Outcome::InternalError`] for that token only.
    pub async fn send_batch(
        &self,
        notifications: &[Notification],
        options: &DeliveryOptions,
    ) -> BatchResult {
        if notifications.is_empty() {
            return BatchResult::new();
        }

        let started = Instant::now();
        let requests: Vec<_> = notifications
            .iter()
            .map(|n| (n.token.as_str(), self.build(n, options)))
            .collect();

        let streams = requests.into_iter().map(|(token, request)| async move {
            let outcome = match request {
                Ok(request) => match AssertUnwindSafe(self.dispatch(request))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => {
                        warn!(token_prefix = token_prefix(token), error = %e, "stream failed");
                        Outcome::InternalError
                    }
                    Err(_) => {
                        warn!(token_prefix = token_prefix(token), "stream panicked");
                        Outcome::InternalError
                    }
                },
                Err(e) => {
                    warn!(token_prefix = token_prefix(token), error = %e, "request build failed");
                    Outcome::InternalError
                }
            };
            (token, outcome)
        });

        let outcomes = join_all(streams).await;

        // Input order: a repeated token keeps its last outcome.
        let mut results = BatchResult::with_capacity(outcomes.len());
        for (token, outcome) in outcomes {
            let _ = results.insert(token.to_string(), outcome);
        }

        let succeeded = results.values().filter(|o| o.is_success()).count();
        info!(
            requested = notifications.len(),
            tokens = results.len(),
            succeeded,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "push batch complete"
        );
        results
    }

    /// Blocking [`send`](Self::send) through the bridge.
    pub fn send_blocking(
        &self,
        token: impl Into<String>,
        payload: Payload,
        options: &DeliveryOptions,
    ) -> Result<Outcome> {
        let client = self.clone();
        let notification = Arc::new(Notification::new(token, payload));
        let options = Arc::new(options.clone());
        self.inner.bridge.run(move || {
            let client = client.clone();
            let notification = Arc::clone(&notification);
            let options = Arc::clone(&options);
            async move { client.send_notification(&notification, &options).await }
        })?
    }

    /// Blocking [`send_batch`](Self::send_batch) through the bridge.
    pub fn send_batch_blocking(
        &self,
        notifications: Vec<Notification>,
        options: &DeliveryOptions,
    ) -> Result<BatchResult> {
        let client = self.clone();
        let notifications = Arc::new(notifications);
        let options = Arc::new(options.clone());
        let results = self.inner.bridge.run(move || {
            let client = client.clone();
            let notifications = Arc::clone(&notifications);
            let options = Arc::clone(&options);
            async move { client.send_batch(&notifications, &options).await }
        })?;
        Ok(results)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
