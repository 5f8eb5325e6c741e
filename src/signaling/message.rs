//! Signaling envelopes carried over the router.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message exchanged between connectors over the [`Router`].
///
/// Wire form: `{"type": "signal", "data": <opaque negotiation data>}`.
/// The router may carry other message types; connectors ignore them.
///
/// [`Router`]: crate::transport::Router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Negotiation data destined for the receiving peer.
    Signal {
        /// Opaque data produced by the sender's negotiation capability.
        data: Value,
    },
}

impl SignalingMessage {
    /// Wrap negotiation data.
    pub fn signal(data: Value) -> Self {
        SignalingMessage::Signal { data }
    }

    /// Serialize to the router's message form.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a router message. Fails for any other message type.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// The carried negotiation data.
    pub fn into_data(self) -> Value {
        match self {
            SignalingMessage::Signal { data } => data,
        }
    }
}
