//! In-memory signaling router.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use crate::core::PeerId;
use crate::transport::{InboundMessages, Router};

type Routes = HashMap<PeerId, mpsc::UnboundedSender<(Value, PeerId)>>;

/// Shared switchboard connecting [`MemoryRouter`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    routes: Arc<Mutex<Routes>>,
}

impl MemoryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router for `id` attached to this hub.
    pub fn router(&self, id: PeerId) -> MemoryRouter {
        MemoryRouter {
            id,
            hub: self.clone(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Deliver `message` from `from` directly to `to`'s subscriber.
    ///
    /// Returns `false` if `to` has no live subscription.
    pub fn deliver(&self, to: &PeerId, message: Value, from: PeerId) -> bool {
        let routes = self.routes.lock();
        match routes.get(to) {
            Some(tx) => tx.send((message, from)).is_ok(),
            None => false,
        }
    }
}

/// A [`Router`] for one peer on a [`MemoryHub`].
///
/// Every outbound message is also kept in a log for assertions.
#[derive(Debug, Clone)]
pub struct MemoryRouter {
    id: PeerId,
    hub: MemoryHub,
    sent: Arc<Mutex<Vec<(PeerId, Value)>>>,
}

impl MemoryRouter {
    /// The peer this router belongs to.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Messages sent through this router, in order.
    pub fn sent(&self) -> Vec<(PeerId, Value)> {
        self.sent.lock().clone()
    }
}

impl Router for MemoryRouter {
    fn send(&self, to: &PeerId, message: Value) {
        self.sent.lock().push((*to, message.clone()));
        if !self.hub.deliver(to, message, self.id) {
            trace!(from = %self.id.short(), to = %to.short(), "no route, message dropped");
        }
    }

    fn subscribe(&self) -> InboundMessages {
        let (tx, rx) = mpsc::unbounded_channel();
        self.hub.routes.lock().insert(self.id, tx);
        rx
    }
}
