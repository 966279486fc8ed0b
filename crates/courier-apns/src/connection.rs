//! Transport seam and the reqwest-backed HTTP/2 connection.
//!
//! [`Connection`] is the only thing the dispatch path needs from the
//! network: post one request, get one response. [`HttpConnection`] wraps a
//! single `reqwest::Client` created once per client instance. reqwest
//! multiplexes concurrent requests to the same host as streams on one
//! HTTP/2 connection, so concurrency here never opens extra sockets.
//!
//! hyper drives each pooled connection with a task spawned on the runtime
//! that opened it. Every exchange therefore runs on a runtime owned by the
//! connection itself, on its own thread. Pooled connections stay polled
//! whichever runtime calls [`Connection::post`], including short-lived
//! runtimes of the blocking bridge and a current-thread runtime whose only
//! thread is blocked waiting on the bridge.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use courier_settings::ConnectionSettings;
use tokio::runtime::{Builder, Handle};
use tokio::sync::{Semaphore, SemaphorePermit, oneshot};
use tracing::{debug, info};

use crate::errors::TransportError;

/// A fully-formed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushRequest {
    /// Target URL.
    pub url: String,
    /// Header name/value pairs, in emission order.
    pub headers: Vec<(&'static str, String)>,
    /// Serialized payload document.
    pub body: Bytes,
}

impl PushRequest {
    /// Value of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushResponse {
    /// HTTP status code.
    pub status: u16,
    /// Gateway-assigned notification id (`apns-id`), if returned.
    pub apns_id: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

impl PushResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            apns_id: None,
            body: body.into(),
        }
    }
}

/// Multiplexed transport shared by all in-flight requests of a client.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Issue `request` and wait for the full response.
    async fn post(&self, request: PushRequest) -> Result<PushResponse, TransportError>;
}

/// Bounds the number of in-flight streams.
#[derive(Debug)]
struct StreamLimiter {
    permits: Semaphore,
    wait: Duration,
}

impl StreamLimiter {
    fn new(max_streams: usize, wait: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_streams.clamp(1, Semaphore::MAX_PERMITS)),
            wait,
        }
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>, TransportError> {
        match tokio::time::timeout(self.wait, self.permits.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(TransportError::Request("stream limiter closed".into())),
            Err(_) => Err(TransportError::PoolTimeout(self.wait)),
        }
    }
}

/// Runtime that owns the pooled connections.
///
/// Runs on a dedicated thread until the last [`HttpConnection`] clone is
/// dropped, which drops `_shutdown` and lets the thread exit.
#[derive(Debug)]
struct ConnectionDriver {
    handle: Handle,
    _shutdown: oneshot::Sender<()>,
}

impl ConnectionDriver {
    fn start() -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        let handle = runtime.handle().clone();
        let (shutdown, stopped) = oneshot::channel::<()>();

        let _ = std::thread::Builder::new()
            .name("courier-conn".into())
            .spawn(move || {
                // Resolves once the sender is dropped.
                let _ = runtime.block_on(stopped);
                debug!("connection driver stopped");
            })
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            handle,
            _shutdown: shutdown,
        })
    }
}

/// HTTP/2 connection built on reqwest.
#[derive(Clone, Debug)]
pub struct HttpConnection {
    client: reqwest::Client,
    limiter: Arc<StreamLimiter>,
    driver: Arc<ConnectionDriver>,
}

impl HttpConnection {
    /// Build the client from connection settings and an optional TLS
    /// client identity.
    pub fn new(
        settings: &ConnectionSettings,
        identity: Option<reqwest::Identity>,
    ) -> Result<Self, TransportError> {
        let read = Duration::from_secs(settings.read_timeout_secs);
        let write = Duration::from_secs(settings.write_timeout_secs);
        let idle = Duration::from_secs(settings.keep_alive_expiry_secs.max(1));

        // The gateway only speaks HTTP/2; without prior knowledge reqwest
        // would negotiate HTTP/1.1 on some TLS stacks.
        let mut builder = reqwest::Client::builder()
            .http2_prior_knowledge()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .read_timeout(read)
            .timeout(read + write)
            .pool_max_idle_per_host(settings.max_idle_connections)
            .pool_idle_timeout(idle);

        if let Some(identity) = identity {
            builder = builder.identity(identity);
        }

        if let Some(url) = settings.proxy_url() {
            let proxy = reqwest::Proxy::all(&url).map_err(|e| TransportError::Build(e.to_string()))?;
            info!(proxy = %url, "routing through proxy");
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            limiter: Arc::new(StreamLimiter::new(
                settings.max_concurrent_streams,
                Duration::from_secs(settings.pool_timeout_secs),
            )),
            driver: Arc::new(ConnectionDriver::start()?),
        })
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn post(&self, request: PushRequest) -> Result<PushResponse, TransportError> {
        let _permit = self.limiter.acquire().await?;

        let client = self.client.clone();
        let task = self.driver.handle.spawn(exchange(client, request));
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(TransportError::Request("exchange task panicked".into())),
            Err(_) => Err(TransportError::Request("connection driver stopped".into())),
        }
    }
}

async fn exchange(
    client: reqwest::Client,
    request: PushRequest,
) -> Result<PushResponse, TransportError> {
    let mut req = client.post(&request.url).body(request.body);
    for (name, value) in request.headers {
        req = req.header(name, value);
    }

    let response = req
        .send()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let apns_id = response
        .headers()
        .get("apns-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    debug!(status, version = ?response.version(), apns_id = ?apns_id, "response received");

    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Body(e.to_string()))?;

    Ok(PushResponse {
        status,
        apns_id,
        body,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
