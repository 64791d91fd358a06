//! Wire protocol for the backend link.
//!
//! Messages travel as WebSocket text frames, one JSON object per frame.
//! Close frames carry a numeric status and an optional reason. Ping and
//! pong frames are handled inside the transport and never reach the owner.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | [`Message`] type and JSON encoding |
//! | `frame` | Inbound frame classification and close codes |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame classification.
pub mod frame;

/// Message payload type and encoding.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{NO_STATUS_CODE, NORMAL_CLOSURE};
pub use message::{Message, decode, encode, from_message, to_message};
