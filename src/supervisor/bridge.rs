//! Adapter between transport callbacks and the supervisor.
//!
//! Each connection attempt gets its own [`HandlerBridge`]. It forwards
//! every event to the owner's handler and, for terminal events, resets the
//! supervisor afterwards:
//!
//! ```text
//! transport ──► bridge ──► owner.on_closed(..)
//!                  │
//!                  └─────► supervisor reset (attempt N only)
//! ```
//!
//! The owner callback runs first, so the owner can still observe the
//! pre-reset state. The bridge holds only a weak reference; once the
//! supervisor is shut down or dropped every event is a no-op.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::error::Error;
use crate::protocol::Message;
use crate::transport::ConnectionHandler;

use super::core::Inner;

// ============================================================================
// HandlerBridge
// ============================================================================

/// Per-attempt wrapper around the owner's handler.
pub(crate) struct HandlerBridge {
    link: Weak<Inner>,
    attempt: u64,
    terminated: AtomicBool,
}

impl HandlerBridge {
    pub(crate) fn new(link: Weak<Inner>, attempt: u64) -> Self {
        Self {
            link,
            attempt,
            terminated: AtomicBool::new(false),
        }
    }

    /// Returns the supervisor if it is still alive and running.
    fn live(&self) -> Option<Arc<Inner>> {
        self.link.upgrade().filter(|inner| !inner.is_defunct())
    }

    fn terminal(&self, notify: impl FnOnce(&dyn ConnectionHandler)) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            debug!(attempt = self.attempt, "Duplicate terminal event suppressed");
            return;
        }

        let Some(inner) = self.live() else {
            debug!(attempt = self.attempt, "Terminal event after shutdown ignored");
            return;
        };

        notify(inner.owner());
        inner.on_terminal(self.attempt);
    }
}

impl ConnectionHandler for HandlerBridge {
    fn on_opened(&self) {
        if let Some(inner) = self.live() {
            inner.owner().on_opened();
        }
    }

    fn on_message(&self, message: Message) {
        if let Some(inner) = self.live() {
            inner.owner().on_message(message);
        }
    }

    fn on_error(&self, cause: &Error) {
        self.terminal(|owner| owner.on_error(cause));
    }

    fn on_closed(&self, code: i32, reason: Option<&str>) {
        self.terminal(|owner| owner.on_closed(code, reason));
    }
}

// ============================================================================
// Tests
// ============================================================================
