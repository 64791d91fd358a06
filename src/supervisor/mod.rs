//! Self-healing backend link.
//!
//! This module wraps the transport layer in a reconnect and heartbeat
//! policy driven by the owner's periodic tick.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Supervisor`] | Owns the active transport and runs the policy |
//! | [`SupervisorBuilder`] | Fluent configuration builder |
//! | [`SupervisorOptions`] | Reconnect and ping intervals |
//! | [`ConnectionState`] | Observable link state |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use backend_link::{Address, ConnectionHandler, Error, Message, Supervisor};
//!
//! struct Game;
//!
//! impl ConnectionHandler for Game {
//!     fn on_opened(&self) {}
//!     fn on_message(&self, _message: Message) {}
//!     fn on_error(&self, _cause: &Error) {}
//!     fn on_closed(&self, _code: i32, _reason: Option<&str>) {}
//! }
//!
//! # async fn example() -> backend_link::Result<()> {
//! let link = Supervisor::builder()
//!     .resolver(|| Address::parse("ws://127.0.0.1:9000/").ok())
//!     .handler(Game)
//!     .ping_interval(Duration::from_secs(5))
//!     .build()?;
//!
//! loop {
//!     link.tick()?;
//!     tokio::time::sleep(Duration::from_millis(16)).await;
//! }
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Per-attempt callback adapter.
mod bridge;

/// Fluent builder pattern for supervisor configuration.
pub mod builder;

/// Core supervisor implementation.
pub mod core;

/// Reconnect and heartbeat timing.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{ConnectionState, Supervisor};
pub use builder::SupervisorBuilder;
pub use options::{DEFAULT_PING_INTERVAL, DEFAULT_RECONNECT_INTERVAL, SupervisorOptions};
