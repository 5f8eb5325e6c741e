//! Collaborator interfaces.
//!
//! peer-link does not implement signaling transport or connection
//! negotiation itself. It drives implementations of these traits:
//!
//! - [`Router`]: delivers signaling messages between peers by [`PeerId`]
//! - [`PeerFactory`] / [`PeerConnection`]: one negotiation capability per
//!   attempt, which becomes the raw duplex channel once connected
//!
//! Events flow back from a capability over an unbounded queue, so all state
//! changes happen on whichever task owns the receiving end.

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;

use super::error::TransportError;
use crate::core::PeerId;
use crate::core::constants::DEFAULT_TRICKLE;

/// Event emitted by a negotiation capability.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Local negotiation data that must reach the remote peer.
    Signal(Value),
    /// Negotiation succeeded; the capability is now a raw duplex channel.
    Connect,
    /// A chunk received on the raw channel.
    Data(Bytes),
    /// The capability or channel closed.
    Close,
    /// The capability or channel reported an error.
    Error(String),
}

/// Receiving end of a capability's event queue.
pub type PeerEvents = mpsc::UnboundedReceiver<PeerEvent>;

/// Sending end of a capability's event queue.
pub type PeerEventSender = mpsc::UnboundedSender<PeerEvent>;

/// Inbound router messages, tagged with the sender's id.
pub type InboundMessages = mpsc::UnboundedReceiver<(Value, PeerId)>;

/// Options passed when creating a negotiation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerOptions {
    /// Whether this side starts the negotiation.
    pub initiator: bool,
    /// Emit negotiation data incrementally instead of in one batch.
    pub trickle: bool,
}

impl PeerOptions {
    /// Options for the side that starts negotiating.
    pub fn initiator() -> Self {
        Self {
            initiator: true,
            trickle: DEFAULT_TRICKLE,
        }
    }

    /// Options for the side answering an unsolicited signal.
    pub fn responder() -> Self {
        Self {
            initiator: false,
            trickle: DEFAULT_TRICKLE,
        }
    }
}

/// A negotiation capability, and after [`PeerEvent::Connect`] the raw
/// duplex channel it produced.
pub trait PeerConnection: Send + 'static {
    /// Feed negotiation data received from the remote peer.
    fn signal(&mut self, data: Value);

    /// Write one chunk to the raw channel.
    fn send(&mut self, chunk: Bytes) -> Result<(), TransportError>;

    /// Tear down the capability or channel. Must be idempotent.
    fn destroy(&mut self);
}

/// Creates negotiation capabilities.
pub trait PeerFactory: Send + Sync + 'static {
    /// Create a capability and the queue its events arrive on.
    fn create(&self, options: PeerOptions) -> (Box<dyn PeerConnection>, PeerEvents);

    /// Whether the underlying connection technology is available.
    fn is_supported(&self) -> bool {
        true
    }
}

/// Signaling transport addressed by [`PeerId`].
pub trait Router: Send + Sync + 'static {
    /// Send a message to a peer. Delivery is best effort.
    fn send(&self, to: &PeerId, message: Value);

    /// Subscribe to inbound messages.
    fn subscribe(&self) -> InboundMessages;
}
