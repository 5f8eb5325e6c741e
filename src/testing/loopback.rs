//! Loopback negotiation capability.
//!
//! Simulates an offer/answer exchange between two connections created from
//! the same [`LoopbackNetwork`], then pairs them into an in-memory duplex
//! channel. Negotiation data is JSON:
//!
//! ```text
//! initiator -> responder   {"type":"offer","token":N}
//!                          {"type":"candidate","token":N}   (trickle only)
//! responder -> initiator   {"type":"answer","token":M}
//! ```
//!
//! The initiator connects on the answer and notifies the responder, so
//! neither side can observe data before its own connect event.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::trace;

use crate::transport::{
    PeerConnection, PeerEvent, PeerEventSender, PeerEvents, PeerFactory, PeerOptions,
    TransportError,
};

#[derive(Debug, Default)]
struct NetworkState {
    next_token: u64,
    endpoints: HashMap<u64, PeerEventSender>,
}

/// Registry pairing loopback connections by token.
#[derive(Debug, Clone, Default)]
pub struct LoopbackNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LoopbackNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory creating connections on this network.
    pub fn factory(&self) -> LoopbackFactory {
        LoopbackFactory {
            network: self.clone(),
        }
    }

    /// Number of live connections.
    pub fn endpoint_count(&self) -> usize {
        self.state.lock().endpoints.len()
    }

    fn register(&self, events: PeerEventSender) -> u64 {
        let mut state = self.state.lock();
        state.next_token += 1;
        let token = state.next_token;
        state.endpoints.insert(token, events);
        token
    }

    fn lookup(&self, token: u64) -> Option<PeerEventSender> {
        self.state.lock().endpoints.get(&token).cloned()
    }

    fn unregister(&self, token: u64) {
        self.state.lock().endpoints.remove(&token);
    }
}

/// [`PeerFactory`] for a [`LoopbackNetwork`].
#[derive(Debug, Clone)]
pub struct LoopbackFactory {
    network: LoopbackNetwork,
}

impl PeerFactory for LoopbackFactory {
    fn create(&self, options: PeerOptions) -> (Box<dyn PeerConnection>, PeerEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.network.register(tx.clone());
        let connection = LoopbackConnection {
            token,
            options,
            network: self.network.clone(),
            events: tx,
            remote: None,
            destroyed: false,
        };
        if options.initiator {
            connection.emit(PeerEvent::Signal(json!({ "type": "offer", "token": token })));
            if options.trickle {
                connection.emit(PeerEvent::Signal(
                    json!({ "type": "candidate", "token": token }),
                ));
            }
        }
        (Box::new(connection), rx)
    }
}

/// One side of a loopback pair.
#[derive(Debug)]
pub struct LoopbackConnection {
    token: u64,
    options: PeerOptions,
    network: LoopbackNetwork,
    events: PeerEventSender,
    remote: Option<PeerEventSender>,
    destroyed: bool,
}

impl LoopbackConnection {
    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }

    fn peer_token(data: &Value) -> Option<u64> {
        data.get("token").and_then(Value::as_u64)
    }
}

impl PeerConnection for LoopbackConnection {
    fn signal(&mut self, data: Value) {
        if self.destroyed {
            return;
        }
        let kind = data.get("type").and_then(Value::as_str).unwrap_or_default();
        let remote = Self::peer_token(&data).and_then(|token| self.network.lookup(token));

        match (kind, remote, self.options.initiator) {
            ("offer", Some(remote), false) => {
                self.remote = Some(remote);
                self.emit(PeerEvent::Signal(
                    json!({ "type": "answer", "token": self.token }),
                ));
            }
            ("answer", Some(remote), true) => {
                let _ = remote.send(PeerEvent::Connect);
                self.remote = Some(remote);
                self.emit(PeerEvent::Connect);
            }
            ("candidate", _, _) => {
                trace!(token = self.token, "candidate accepted");
            }
            _ => self.emit(PeerEvent::Error(format!("unexpected signal: {data}"))),
        }
    }

    fn send(&mut self, chunk: Bytes) -> Result<(), TransportError> {
        if self.destroyed {
            return Err(TransportError::Closed);
        }
        let remote = self.remote.as_ref().ok_or(TransportError::Closed)?;
        remote
            .send(PeerEvent::Data(chunk))
            .map_err(|_| TransportError::Closed)
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.network.unregister(self.token);
        if let Some(remote) = self.remote.take() {
            let _ = remote.send(PeerEvent::Close);
        }
    }
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        self.destroy();
    }
}
