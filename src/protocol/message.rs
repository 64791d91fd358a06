//! Structured message payloads.
//!
//! A [`Message`] is an ordered JSON object. The link never interprets its
//! contents; it only encodes outbound messages into text frames and decodes
//! inbound text frames back into objects.
//!
//! # Format
//!
//! One message per text frame:
//!
//! ```json
//! { "type": "hello", "server": "lobby-1" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Message
// ============================================================================

/// Ordered mapping of string keys to JSON values.
pub type Message = Map<String, Value>;

// ============================================================================
// Encoding
// ============================================================================

/// Serializes a message into frame text.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
#[inline]
pub fn encode(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Parses frame text into a message.
///
/// # Errors
///
/// - [`Error::Json`] if the text is not valid JSON
/// - [`Error::Protocol`] if the document is not an object
pub fn decode(text: &str) -> Result<Message> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::protocol(format!(
            "expected JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

// ============================================================================
// Typed Conversion
// ============================================================================

/// Converts a serializable record into a message.
///
/// # Errors
///
/// - [`Error::Json`] if serialization fails
/// - [`Error::Protocol`] if the record does not serialize to an object
pub fn to_message<T: Serialize>(record: &T) -> Result<Message> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::protocol(format!(
            "record serialized to {}, expected object",
            kind_of(&other)
        ))),
    }
}

/// Converts a message into a typed record.
///
/// # Errors
///
/// Returns [`Error::Json`] if the message does not match the record shape.
pub fn from_message<T: DeserializeOwned>(message: Message) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(message))?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Hello {
        #[serde(rename = "type")]
        kind: String,
        players: u32,
    }

    #[test]
    fn test_encode_preserves_key_order() {
        let mut message = Message::new();
        message.insert("type".into(), json!("hello"));
        message.insert("alpha".into(), json!(1));
        message.insert("beta".into(), json!(true));

        assert_eq!(
            encode(&message).unwrap(),
            r#"{"type":"hello","alpha":1,"beta":true}"#
        );
    }

    #[test]
    fn test_decode_object() {
        let message = decode(r#"{"type":"poll","options":["a","b"]}"#).unwrap();
        assert_eq!(message["type"], json!("poll"));
        assert_eq!(message["options"], json!(["a", "b"]));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode("[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_typed_conversion() {
        let hello = Hello {
            kind: "hello".into(),
            players: 3,
        };

        let message = to_message(&hello).unwrap();
        assert_eq!(message["type"], json!("hello"));

        let back: Hello = from_message(message).unwrap();
        assert_eq!(back, hello);
    }

    #[test]
    fn test_to_message_rejects_scalar() {
        let err = to_message(&42).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
