//! Backend Link - Self-healing WebSocket client for a game backend.
//!
//! This library keeps a long-lived JSON message channel to a backend
//! service open, reconnecting after failures and sending keepalive pings
//! at a steady cadence.
//!
//! # Architecture
//!
//! The link is split into two layers:
//!
//! - **Transport**: One physical WebSocket connection. Batches outbound
//!   messages, decodes inbound ones, reports exactly one terminal event
//! - **Supervisor**: Owns at most one transport. Decides when to connect
//!   and when to ping, driven by the owner's periodic [`Supervisor::tick`]
//!
//! Key design principles:
//!
//! - No internal timer thread; the owner's tick is the only clock
//! - `send` and `is_connected` never take a lock
//! - Messages are dropped, not buffered, while disconnected
//! - Late events from superseded connections cannot disturb a newer one
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use backend_link::{Address, ConnectionHandler, Error, Message, Result, Supervisor};
//!
//! struct Game;
//!
//! impl ConnectionHandler for Game {
//!     fn on_opened(&self) {
//!         println!("link up");
//!     }
//!     fn on_message(&self, message: Message) {
//!         println!("backend says {message:?}");
//!     }
//!     fn on_error(&self, cause: &Error) {
//!         eprintln!("link failed: {cause}");
//!     }
//!     fn on_closed(&self, code: i32, reason: Option<&str>) {
//!         println!("link closed: {code} {reason:?}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let address = Address::parse("wss://backend.example.com/session")?;
//!     let link = Supervisor::new(address, Game)?;
//!
//!     let mut hello = Message::new();
//!     hello.insert("type".into(), "hello".into());
//!
//!     loop {
//!         link.tick()?;
//!         if link.is_connected() {
//!             link.send(&hello);
//!         }
//!         tokio::time::sleep(Duration::from_millis(16)).await;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`address`] | Backend addresses and resolvers |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | JSON message encoding and close codes |
//! | [`supervisor`] | Reconnect and heartbeat policy |
//! | [`transport`] | WebSocket connection layer |

// ============================================================================
// Modules
// ============================================================================

/// Backend addresses and address resolvers.
pub mod address;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire protocol message types.
pub mod protocol;

/// Reconnect and heartbeat supervision.
///
/// Use [`Supervisor::builder()`] to create a configured link.
pub mod supervisor;

/// WebSocket transport layer.
///
/// Usable on its own for a single connection without reconnects.
pub mod transport;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

// Address types
pub use address::{Address, AddressResolver, Scheme};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Message, NO_STATUS_CODE, NORMAL_CLOSURE};

// Supervisor types
pub use supervisor::{ConnectionState, Supervisor, SupervisorBuilder, SupervisorOptions};

// Transport types
pub use transport::{ConnectionHandler, Transport, TransportId, TransportOptions};
