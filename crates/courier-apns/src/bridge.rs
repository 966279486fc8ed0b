//! Blocking bridge over async operations.
//!
//! Lets synchronous callers run an async operation to completion and wait
//! for its result. Which way the operation is driven depends on where the
//! caller is:
//!
//! | Caller | Strategy |
//! |--------|----------|
//! | isolation forced by the host | [`Strategy::ThreadIsolated`] |
//! | already inside a tokio runtime | [`Strategy::ThreadIsolated`] |
//! | plain thread | [`Strategy::Direct`] |
//!
//! `Direct` falls back to [`Strategy::ManagedLoop`] when its runtime cannot
//! be created, and to `ThreadIsolated` when the operation panics. The
//! return contract is the same whichever strategy ran.
//!
//! A timed-out isolated call only stops the caller's wait. The worker
//! thread keeps driving the operation and exits when it finishes; its
//! runtime is reclaimed with the thread.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use courier_settings::BridgeSettings;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, warn};

use crate::errors::BridgeError;

/// Default wait for an isolated worker.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Grace period for background tasks when a managed runtime shuts down.
const MANAGED_SHUTDOWN: Duration = Duration::from_secs(1);

/// How a blocking call drives its operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Fresh current-thread runtime on the calling thread, dropped after use.
    Direct,
    /// Explicitly built runtime with an explicit shutdown.
    ManagedLoop,
    /// Dedicated OS thread with its own runtime.
    ThreadIsolated,
}

/// Pick the strategy for one call.
pub fn select_strategy(force_isolation: bool, inside_runtime: bool) -> Strategy {
    if force_isolation || inside_runtime {
        Strategy::ThreadIsolated
    } else {
        Strategy::Direct
    }
}

/// Bridge configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Always isolate on a worker thread.
    ///
    /// Computed once by the host at startup and passed in; the bridge never
    /// probes the environment for it.
    pub force_thread_isolation: bool,
    /// How long a caller waits for an isolated worker.
    pub join_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            force_thread_isolation: false,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

impl BridgeOptions {
    /// Options described by settings.
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self {
            force_thread_isolation: settings.force_thread_isolation,
            join_timeout: Duration::from_secs(settings.join_timeout_secs),
        }
    }
}

/// Why direct execution gave up.
enum DirectFailure {
    Lifecycle(String),
    Panicked(String),
}

/// Runs async operations for blocking callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bridge {
    options: BridgeOptions,
}

impl Bridge {
    /// Bridge with the given options.
    pub fn new(options: BridgeOptions) -> Self {
        Self { options }
    }

    /// Configured options.
    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Strategy a call from the current thread would start with.
    pub fn strategy(&self) -> Strategy {
        select_strategy(
            self.options.force_thread_isolation,
            Handle::try_current().is_ok(),
        )
    }

    /// Run the future produced by `factory` to completion and return its
    /// output.
    ///
    /// `factory` may be called more than once when a strategy falls back;
    /// each call must produce an independent future.
    pub fn run<F, Fut, T>(&self, factory: F) -> Result<T, BridgeError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = T>,
        T: Send + 'static,
    {
        self.run_with(factory, current_thread_runtime)
    }

    /// [`run`](Self::run), building the direct strategy's runtime with
    /// `direct_runtime`.
    fn run_with<F, Fut, T>(
        &self,
        factory: F,
        direct_runtime: RuntimeFactory,
    ) -> Result<T, BridgeError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = T>,
        T: Send + 'static,
    {
        let strategy = self.strategy();
        debug!(?strategy, "bridging blocking call");

        match strategy {
            Strategy::ThreadIsolated => self.run_isolated(factory),
            Strategy::ManagedLoop => run_managed(&factory),
            Strategy::Direct => match run_direct(&factory, direct_runtime) {
                Ok(value) => Ok(value),
                Err(DirectFailure::Lifecycle(reason)) => {
                    warn!(%reason, "direct runtime failed, using managed runtime");
                    run_managed(&factory)
                }
                Err(DirectFailure::Panicked(reason)) => {
                    warn!(%reason, "direct execution panicked, isolating on worker thread");
                    self.run_isolated(factory)
                }
            },
        }
    }

    fn run_isolated<F, Fut, T>(&self, factory: F) -> Result<T, BridgeError>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = T>,
        T: Send + 'static,
    {
        let timeout = self.options.join_timeout;
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("courier-bridge".into())
            .spawn(move || {
                let result = match current_thread_runtime() {
                    Ok(runtime) => {
                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(factory())));
                        drop(runtime);
                        outcome.map_err(|payload| BridgeError::Panicked(panic_message(&*payload)))
                    }
                    Err(e) => Err(BridgeError::Runtime(e.to_string())),
                };
                // The caller may have stopped waiting.
                let _ = tx.send(result);
            })
            .map_err(|e| BridgeError::Spawn(e.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = handle.join();
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "bridge worker timed out; leaving it to finish on its own");
                Err(BridgeError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(BridgeError::NoResult)
            }
        }
    }
}

type RuntimeFactory = fn() -> std::io::Result<Runtime>;

fn current_thread_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

fn run_direct<F, Fut, T>(factory: &F, build: RuntimeFactory) -> Result<T, DirectFailure>
where
    F: Fn() -> Fut,
    Fut: Future<Output = T>,
{
    let runtime = build().map_err(|e| DirectFailure::Lifecycle(e.to_string()))?;
    panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(factory())))
        .map_err(|payload| DirectFailure::Panicked(panic_message(&*payload)))
}

fn run_managed<F, Fut, T>(factory: &F) -> Result<T, BridgeError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = T>,
{
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("courier-bridge-managed")
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Runtime(e.to_string()))?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(factory())));
    runtime.shutdown_timeout(MANAGED_SHUTDOWN);
    outcome.map_err(|payload| BridgeError::Panicked(panic_message(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
