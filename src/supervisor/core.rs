//! Connection supervisor: reconnect and heartbeat policy.
//!
//! The [`Supervisor`] holds at most one live [`Transport`] and drives it
//! through an externally invoked [`tick`](Supervisor::tick). There is no
//! internal timer thread.
//!
//! # State Machine
//!
//! | State | `tick()` | transport opened | transport error/closed |
//! |-------|----------|------------------|------------------------|
//! | Disconnected | attempt if reconnect interval elapsed | - | - |
//! | Connecting | no-op | → Connected | → Disconnected, restart timer |
//! | Connected | ping if ping interval elapsed | - | → Disconnected, restart timer |
//!
//! # Concurrency
//!
//! [`send`](Supervisor::send) and [`is_connected`](Supervisor::is_connected)
//! read the active transport through an atomically published reference and
//! never take a lock. Policy state (phase, timestamps) sits behind a short
//! mutex shared by `tick` and the terminal-event path; each terminal event
//! only resets the attempt it belongs to, so a late event from an old
//! transport can never clear a newer one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::address::AddressResolver;
use crate::error::Result;
use crate::protocol::{Message, to_message};
use crate::transport::{ConnectionHandler, SharedHandler, Transport};

use super::bridge::HandlerBridge;
use super::builder::SupervisorBuilder;
use super::options::SupervisorOptions;

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No transport and no attempt in flight.
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// A transport is established.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Policy phase, tagged with the attempt it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Disconnected,
    Connecting { attempt: u64 },
    Connected { attempt: u64 },
}

impl Phase {
    fn attempt(self) -> Option<u64> {
        match self {
            Self::Disconnected => None,
            Self::Connecting { attempt } | Self::Connected { attempt } => Some(attempt),
        }
    }
}

/// Mutable policy state.
struct Policy {
    phase: Phase,
    last_connect_attempt: Instant,
    /// `None` until the first ping of the current connection.
    last_ping: Option<Instant>,
}

/// Returns `true` if at least `interval` has passed since `since`.
#[inline]
fn elapsed(since: Instant, now: Instant, interval: Duration) -> bool {
    now.saturating_duration_since(since) >= interval
}

// ============================================================================
// Inner
// ============================================================================

/// State shared with the per-attempt bridges and connect tasks.
pub(crate) struct Inner {
    resolver: Box<dyn AddressResolver>,
    owner: SharedHandler,
    options: SupervisorOptions,
    runtime: Handle,
    /// Active transport, published for lock-free readers.
    transport: ArcSwapOption<Transport>,
    policy: Mutex<Policy>,
    /// Number of the most recent attempt.
    attempts: AtomicU64,
    defunct: AtomicBool,
}

impl Inner {
    #[inline]
    pub(crate) fn owner(&self) -> &dyn ConnectionHandler {
        self.owner.as_ref()
    }

    #[inline]
    pub(crate) fn is_defunct(&self) -> bool {
        self.defunct.load(Ordering::Acquire)
    }

    fn tick(self: &Arc<Self>, now: Instant) -> Result<()> {
        if self.is_defunct() {
            return Ok(());
        }

        {
            let mut policy = self.policy.lock();
            let phase = policy.phase;

            match phase {
                Phase::Connecting { .. } => return Ok(()),

                Phase::Connected { .. } => {
                    let due = policy
                        .last_ping
                        .is_none_or(|last| elapsed(last, now, self.options.ping_interval));

                    if due {
                        policy.last_ping = Some(now);
                        drop(policy);
                        if let Some(transport) = &*self.transport.load() {
                            transport.ping();
                        }
                    }
                    return Ok(());
                }

                Phase::Disconnected => {
                    if !elapsed(policy.last_connect_attempt, now, self.options.reconnect_interval) {
                        return Ok(());
                    }
                    policy.last_connect_attempt = now;
                }
            }
        }

        self.initiate()
    }

    /// Resolves an address and starts an asynchronous connect.
    ///
    /// The resolver runs without the policy lock held, so it may call back
    /// into the supervisor. The attempt is committed only if the link is
    /// still disconnected and running afterwards.
    fn initiate(self: &Arc<Self>) -> Result<()> {
        let Some(address) = self.resolver.resolve() else {
            debug!("No backend address available");
            return Ok(());
        };

        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        let bridge = Arc::new(HandlerBridge::new(Arc::downgrade(self), attempt));
        let connect = Transport::connect(address.clone(), bridge, self.options.transport)?;

        {
            let mut policy = self.policy.lock();
            if self.is_defunct() || policy.phase != Phase::Disconnected {
                debug!(attempt, "Connect attempt superseded before start");
                return Ok(());
            }
            policy.phase = Phase::Connecting { attempt };
        }

        info!(attempt, %address, "Connecting to backend");

        let link = Arc::downgrade(self);
        self.runtime.spawn(async move {
            let result = connect.await;
            Self::complete(&link, attempt, result);
        });

        Ok(())
    }

    /// Publishes the outcome of a connect attempt.
    fn complete(link: &Weak<Self>, attempt: u64, result: Result<Transport>) {
        let transport = match result {
            Ok(transport) => transport,
            Err(e) => {
                // The bridge has already reset the policy.
                debug!(attempt, error = %e, "Connect attempt finished with error");
                return;
            }
        };

        let Some(inner) = link.upgrade() else {
            debug!(attempt, id = %transport.id(), "Supervisor gone, closing transport");
            transport.close();
            return;
        };

        let mut policy = inner.policy.lock();
        let current = policy.phase == Phase::Connecting { attempt };

        if inner.is_defunct() || !current || !transport.is_connected() {
            debug!(attempt, id = %transport.id(), "Discarding superseded transport");
            transport.close();
            return;
        }

        info!(attempt, id = %transport.id(), address = %transport.address(), "Backend link connected");
        inner.transport.store(Some(Arc::new(transport)));
        policy.phase = Phase::Connected { attempt };
        policy.last_ping = None;
    }

    /// Returns the attempt the current phase belongs to.
    #[cfg(test)]
    pub(crate) fn current_attempt(&self) -> Option<u64> {
        self.policy.lock().phase.attempt()
    }

    /// Returns to `Disconnected` if `attempt` is still the active one.
    pub(crate) fn on_terminal(&self, attempt: u64) {
        let mut policy = self.policy.lock();

        if policy.phase.attempt() != Some(attempt) {
            debug!(attempt, "Ignoring terminal event from superseded attempt");
            return;
        }

        self.transport.store(None);
        policy.phase = Phase::Disconnected;
        policy.last_connect_attempt = Instant::now();
        policy.last_ping = None;

        warn!(
            attempt,
            retry_in_ms = self.options.reconnect_interval.as_millis() as u64,
            "Backend link lost"
        );
    }

    fn shutdown(&self) {
        if self.defunct.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut policy = self.policy.lock();
        policy.phase = Phase::Disconnected;

        if let Some(transport) = self.transport.swap(None) {
            transport.close();
        }

        info!(
            attempts = self.attempts.load(Ordering::Acquire),
            "Backend link shut down"
        );
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Self-healing link to the backend.
///
/// Call [`tick`](Self::tick) periodically (for example once per frame);
/// it reconnects after failures and keeps the connection alive with
/// pings. [`send`](Self::send) may be called from any thread.
///
/// Dropping the supervisor shuts it down.
///
/// # Example
///
/// ```no_run
/// use backend_link::{Address, ConnectionHandler, Error, Message, Supervisor};
///
/// struct Log;
///
/// impl ConnectionHandler for Log {
///     fn on_opened(&self) {}
///     fn on_message(&self, message: Message) {
///         println!("{message:?}");
///     }
///     fn on_error(&self, cause: &Error) {
///         eprintln!("{cause}");
///     }
///     fn on_closed(&self, _code: i32, _reason: Option<&str>) {}
/// }
///
/// # async fn example() -> backend_link::Result<()> {
/// let address = Address::parse("ws://127.0.0.1:9000/")?;
/// let link = Supervisor::new(address, Log)?;
///
/// // Once per frame:
/// link.tick()?;
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    pub(crate) inner: Arc<Inner>,
}

impl Supervisor {
    /// Creates a supervisor with default options and starts connecting.
    ///
    /// Must be called inside a tokio runtime; use
    /// [`builder`](Self::builder) to supply a runtime handle explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if no runtime is
    /// available or the resolved address has an unsupported scheme.
    pub fn new(
        resolver: impl AddressResolver,
        handler: impl ConnectionHandler,
    ) -> Result<Self> {
        Self::builder().resolver(resolver).handler(handler).build()
    }

    /// Creates a builder for configuring a supervisor.
    #[inline]
    #[must_use]
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Starts a supervisor from validated parts and makes the initial attempt.
    pub(crate) fn start(
        resolver: Box<dyn AddressResolver>,
        owner: SharedHandler,
        options: SupervisorOptions,
        runtime: Handle,
    ) -> Result<Self> {
        let now = Instant::now();

        let inner = Arc::new(Inner {
            resolver,
            owner,
            options,
            runtime,
            transport: ArcSwapOption::empty(),
            policy: Mutex::new(Policy {
                phase: Phase::Disconnected,
                last_connect_attempt: now,
                last_ping: None,
            }),
            attempts: AtomicU64::new(0),
            defunct: AtomicBool::new(false),
        });

        debug!(
            reconnect_ms = options.reconnect_interval.as_millis() as u64,
            ping_ms = options.ping_interval.as_millis() as u64,
            "Starting backend link"
        );

        inner.initiate()?;

        Ok(Self { inner })
    }

    /// Runs one policy step at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the resolver
    /// produced an address with an unsupported scheme. The link stays
    /// disconnected until the next reconnect window.
    #[inline]
    pub fn tick(&self) -> Result<()> {
        self.tick_at(Instant::now())
    }

    /// Runs one policy step at `now`.
    ///
    /// `now` drives both timers, but a disconnect stamps the start of the
    /// next reconnect window with the real [`Instant::now()`] at the moment
    /// the transport terminated. Instants passed here must therefore come
    /// from the same monotonic clock.
    ///
    /// # Errors
    ///
    /// See [`tick`](Self::tick).
    pub fn tick_at(&self, now: Instant) -> Result<()> {
        self.inner.tick(now)
    }

    /// Queues a message if the link is connected.
    ///
    /// Returns `false` and drops the message otherwise. Nothing is buffered
    /// across a disconnect.
    pub fn send(&self, message: &Message) -> bool {
        match &*self.inner.transport.load() {
            Some(transport) => transport.send(message),
            None => false,
        }
    }

    /// Serializes a record into a message and sends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object.
    pub fn send_record<T: Serialize>(&self, record: &T) -> Result<bool> {
        Ok(self.send(&to_message(record)?))
    }

    /// Returns `true` if a transport is established.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.transport.load().is_some()
    }

    /// Returns the current link state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self.inner.policy.lock().phase {
            Phase::Disconnected => ConnectionState::Disconnected,
            Phase::Connecting { .. } => ConnectionState::Connecting,
            Phase::Connected { .. } => ConnectionState::Connected,
        }
    }

    /// Returns the timing policy in use.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SupervisorOptions {
        &self.inner.options
    }

    /// Stops the link.
    ///
    /// Closes the active transport and turns every later callback,
    /// including one from an attempt still in flight, into a no-op.
    /// Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has run.
    #[inline]
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.is_defunct()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("options", &self.inner.options)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
