//! Recording capability for driving channels and connectors by hand.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::transport::{
    PeerConnection, PeerEvent, PeerEventSender, PeerEvents, PeerFactory, PeerOptions,
    TransportError,
};

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<Bytes>,
    signals: Vec<Value>,
    destroy_count: usize,
    accept_limit: Option<usize>,
    events: Option<PeerEventSender>,
}

/// A [`PeerConnection`] that records everything written to it.
#[derive(Debug)]
pub struct RecordingConnection {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingConnection {
    /// Create a connection, the probe used to inspect and drive it, and its
    /// event queue.
    pub fn new() -> (Self, RecordedPeer, PeerEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(RecordingState {
            events: Some(tx),
            ..RecordingState::default()
        }));
        let peer = RecordedPeer {
            options: PeerOptions::initiator(),
            state: Arc::clone(&state),
        };
        (Self { state }, peer, rx)
    }
}

impl PeerConnection for RecordingConnection {
    fn signal(&mut self, data: Value) {
        self.state.lock().signals.push(data);
    }

    fn send(&mut self, chunk: Bytes) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.destroy_count > 0 {
            return Err(TransportError::Closed);
        }
        if state.accept_limit.is_some_and(|limit| state.sent.len() >= limit) {
            return Err(TransportError::Send("send rejected".into()));
        }
        state.sent.push(chunk);
        Ok(())
    }

    fn destroy(&mut self) {
        self.state.lock().destroy_count += 1;
    }
}

/// Probe for a [`RecordingConnection`].
#[derive(Debug, Clone)]
pub struct RecordedPeer {
    options: PeerOptions,
    state: Arc<Mutex<RecordingState>>,
}

impl RecordedPeer {
    /// Options the connection was created with.
    pub fn options(&self) -> PeerOptions {
        self.options
    }

    /// Chunks written to the connection, in order.
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().sent.clone()
    }

    /// Remote negotiation data fed into the connection, in order.
    pub fn signals(&self) -> Vec<Value> {
        self.state.lock().signals.clone()
    }

    /// Check if `destroy` was called.
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroy_count > 0
    }

    /// Number of `destroy` calls.
    pub fn destroy_count(&self) -> usize {
        self.state.lock().destroy_count
    }

    /// Emit an event as if the capability produced it.
    ///
    /// Returns `false` if nobody is listening any more.
    pub fn emit(&self, event: PeerEvent) -> bool {
        match self.state.lock().events.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Reject every `send` after `count` chunks have been accepted.
    pub fn accept_only(&self, count: usize) {
        self.state.lock().accept_limit = Some(count);
    }

    /// Drop the event sender, ending the event queue.
    pub fn close_events(&self) {
        self.state.lock().events = None;
    }
}

/// A [`PeerFactory`] producing [`RecordingConnection`]s.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    created: Mutex<Vec<RecordedPeer>>,
    unsupported: bool,
}

impl RecordingFactory {
    /// Create a factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory that reports the technology as unavailable.
    pub fn unsupported() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            unsupported: true,
        }
    }

    /// Probes for every connection created so far, in creation order.
    pub fn created(&self) -> Vec<RecordedPeer> {
        self.created.lock().clone()
    }

    /// Number of connections created so far.
    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl PeerFactory for RecordingFactory {
    fn create(&self, options: PeerOptions) -> (Box<dyn PeerConnection>, PeerEvents) {
        let (connection, mut peer, events) = RecordingConnection::new();
        peer.options = options;
        self.created.lock().push(peer);
        (Box::new(connection), events)
    }

    fn is_supported(&self) -> bool {
        !self.unsupported
    }
}
