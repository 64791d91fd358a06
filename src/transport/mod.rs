//! WebSocket transport layer.
//!
//! This module owns the physical connection to the backend: handshake,
//! outbound batching, inbound dispatch and terminal-event detection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Transport       │                              │  Backend        │
//! │                  │         WebSocket            │                 │
//! │  OutboundQueue ──┼─────────────────────────────►│                 │
//! │  event loop    ◄─┼──────────────────────────────┤                 │
//! │        │         │        ws:// or wss://       │                 │
//! └────────┼─────────┘                              └─────────────────┘
//!          ▼
//!   ConnectionHandler
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | [`Transport`] and its event loop |
//! | `handler` | [`ConnectionHandler`] callback interface |
//! | `options` | [`TransportOptions`] limits and timeouts |
//! | `queue` | [`OutboundQueue`] single-flight flush queue |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Lifecycle callback interface.
pub mod handler;

/// Transport limits and timeouts.
pub mod options;

/// Outbound queue with single-flight flushing.
pub mod queue;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Transport, TransportId};
pub use handler::{ConnectionHandler, SharedHandler};
pub use options::TransportOptions;
pub use queue::OutboundQueue;
