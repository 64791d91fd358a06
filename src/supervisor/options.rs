//! Reconnect and heartbeat policy.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use backend_link::SupervisorOptions;
//!
//! let options = SupervisorOptions::new()
//!     .with_reconnect_interval(Duration::from_secs(5))
//!     .with_ping_interval(Duration::from_secs(1));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::TransportOptions;

// ============================================================================
// Constants
// ============================================================================

/// Minimum time between connection attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// Minimum time between heartbeats while connected.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// SupervisorOptions
// ============================================================================

/// Timing policy for a [`Supervisor`](super::Supervisor).
///
/// The reconnect and ping timers are independent: one runs only while
/// disconnected, the other only while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Time that must elapse after an attempt or a disconnect before the
    /// next attempt.
    pub reconnect_interval: Duration,

    /// Time that must elapse between two pings.
    pub ping_interval: Duration,

    /// Limits applied to each transport.
    pub transport: TransportOptions,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SupervisorOptions {
    /// Creates options with the default 10s reconnect and 2s ping intervals.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            ping_interval: DEFAULT_PING_INTERVAL,
            transport: TransportOptions::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SupervisorOptions {
    /// Sets the reconnect interval.
    #[inline]
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the ping interval.
    #[inline]
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Sets the transport limits.
    #[inline]
    #[must_use]
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SupervisorOptions {
    /// Checks that both intervals and all transport limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an interval or limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_interval.is_zero() {
            return Err(Error::config("reconnect_interval must be greater than zero"));
        }
        if self.ping_interval.is_zero() {
            return Err(Error::config("ping_interval must be greater than zero"));
        }
        self.transport.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
