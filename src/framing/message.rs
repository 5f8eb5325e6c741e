//! Decoded application messages.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::FramingError;

/// A message surfaced by a framed channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Payload reassembled from a start/payload/end chunk sequence.
    Json(Value),
    /// Chunk received outside any framed sequence, passed through untouched.
    Raw(Bytes),
}

impl Message {
    /// Deserialize the message into a typed value.
    ///
    /// Raw chunks are parsed as JSON text.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FramingError> {
        match self {
            Message::Json(value) => {
                serde_json::from_value(value.clone()).map_err(FramingError::Malformed)
            }
            Message::Raw(bytes) => serde_json::from_slice(bytes).map_err(FramingError::Malformed),
        }
    }

    /// The decoded JSON value, if this was a framed message.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Message::Json(value) => Some(value),
            Message::Raw(_) => None,
        }
    }

    /// The raw chunk, if this was a passthrough message.
    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Message::Json(_) => None,
            Message::Raw(bytes) => Some(bytes),
        }
    }

    /// Check if this message bypassed framing.
    pub fn is_raw(&self) -> bool {
        matches!(self, Message::Raw(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        seq: u32,
    }

    #[test]
    fn test_decode_json_message() {
        let msg = Message::Json(json!({ "seq": 4 }));
        assert_eq!(msg.decode::<Ping>().unwrap(), Ping { seq: 4 });
        assert!(!msg.is_raw());
        assert!(msg.as_raw().is_none());
    }

    #[test]
    fn test_decode_raw_message() {
        let msg = Message::Raw(Bytes::from_static(br#"{"seq":9}"#));
        assert!(msg.is_raw());
        assert_eq!(msg.decode::<Ping>().unwrap(), Ping { seq: 9 });
        assert!(msg.as_json().is_none());
    }

    #[test]
    fn test_decode_type_mismatch() {
        let msg = Message::Json(json!("not a ping"));
        assert!(matches!(msg.decode::<Ping>(), Err(FramingError::Malformed(_))));
    }
}
