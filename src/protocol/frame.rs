//! Inbound frame classification.
//!
//! | Frame | Outcome |
//! |-------|---------|
//! | Text | Decoded into a [`Message`] |
//! | Close | Status code and optional reason |
//! | Binary, Ping, Pong | Ignored |

// ============================================================================
// Imports
// ============================================================================

use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::error::Result;

use super::message::{Message, decode};

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when no status is available.
///
/// Used both for close frames without a payload and for peers that
/// vanish without sending a close frame.
pub const NO_STATUS_CODE: i32 = -1;

/// Close code sent on a deliberate local shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// Inbound
// ============================================================================

/// What an inbound frame means to the link.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    /// A decoded text message.
    Message(Message),
    /// Peer-initiated close.
    Closed {
        code: i32,
        reason: Option<String>,
    },
    /// Control or binary frame with no effect.
    Ignored,
}

impl Inbound {
    /// Classifies a raw WebSocket frame.
    ///
    /// # Errors
    ///
    /// Returns an error if a text frame does not hold a JSON object.
    pub(crate) fn classify(frame: WsMessage) -> Result<Self> {
        match frame {
            WsMessage::Text(text) => decode(text.as_str()).map(Self::Message),
            WsMessage::Close(frame) => Ok(Self::closed(frame)),
            _ => Ok(Self::Ignored),
        }
    }

    fn closed(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => {
                let reason = frame.reason.as_str();
                Self::Closed {
                    code: i32::from(u16::from(frame.code)),
                    reason: (!reason.is_empty()).then(|| reason.to_owned()),
                }
            }
            None => Self::Closed {
                code: NO_STATUS_CODE,
                reason: None,
            },
        }
    }
}

/// Builds the close frame sent on a deliberate local shutdown.
#[inline]
pub(crate) fn normal_close() -> WsMessage {
    WsMessage::Close(Some(CloseFrame {
        code: CloseCode::from(NORMAL_CLOSURE),
        reason: "".into(),
    }))
}

// ============================================================================
// Tests
// ============================================================================
