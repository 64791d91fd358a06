//! Lifecycle callbacks for a connection.
//!
//! A [`ConnectionHandler`] receives every event a transport produces. The
//! transport calls it from its own I/O task, so implementations must be
//! `Send + Sync` and should return quickly.
//!
//! # Event Order
//!
//! ```text
//! on_opened ──► on_message* ──► (on_error | on_closed)
//!      │
//!      └── connect failure: on_error only
//! ```
//!
//! At most one terminal callback (`on_error` or `on_closed`) is delivered
//! per transport.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::error::Error;
use crate::protocol::Message;

// ============================================================================
// ConnectionHandler
// ============================================================================

/// Receives lifecycle events from a connection.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// The connection completed its handshake.
    fn on_opened(&self);

    /// A message arrived from the backend.
    fn on_message(&self, message: Message);

    /// The connection failed, either while connecting or mid-session.
    fn on_error(&self, cause: &Error);

    /// The connection was closed by the peer.
    ///
    /// `code` is [`NO_STATUS_CODE`](crate::protocol::NO_STATUS_CODE) when
    /// the peer sent no status or vanished without a close frame.
    fn on_closed(&self, code: i32, reason: Option<&str>);
}

/// Shared handler reference passed between tasks.
pub type SharedHandler = Arc<dyn ConnectionHandler>;

impl<H: ConnectionHandler + ?Sized> ConnectionHandler for Arc<H> {
    #[inline]
    fn on_opened(&self) {
        (**self).on_opened();
    }

    #[inline]
    fn on_message(&self, message: Message) {
        (**self).on_message(message);
    }

    #[inline]
    fn on_error(&self, cause: &Error) {
        (**self).on_error(cause);
    }

    #[inline]
    fn on_closed(&self, code: i32, reason: Option<&str>) {
        (**self).on_closed(code, reason);
    }
}
