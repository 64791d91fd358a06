//! Transport limits and timeouts.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use backend_link::TransportOptions;
//!
//! let options = TransportOptions::new()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_max_message_size(1024 * 1024);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Largest inbound message accepted (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Deadline for DNS, TCP, TLS and WebSocket handshake combined.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for writing and flushing one outbound batch.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// TransportOptions
// ============================================================================

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Largest inbound message or frame, in bytes.
    pub max_message_size: usize,

    /// Connect deadline.
    pub connect_timeout: Duration,

    /// Write deadline per flush batch.
    pub write_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options with default limits.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Sets the largest inbound message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Sets the connect deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the write deadline.
    #[inline]
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

// ============================================================================
// Validation & Conversion
// ============================================================================

impl TransportOptions {
    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size == 0 {
            return Err(Error::config("max_message_size must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }
        if self.write_timeout.is_zero() {
            return Err(Error::config("write_timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the WebSocket protocol configuration.
    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_message_size))
    }
}

// ============================================================================
// Tests
// ============================================================================
