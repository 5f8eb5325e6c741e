//! Connection negotiator.
//!
//! The [`Connector`] owns every in-flight negotiation attempt. All state
//! changes happen inside its handler methods, which are driven either
//! directly by the caller or by [`Connector::run`] on a single task.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt, StreamMap};
use tracing::{debug, trace, warn};

use super::attempt::{NegotiationAttempt, Role};
use super::config::ConnectorConfig;
use super::handle::ConnectorHandle;
use super::message::SignalingMessage;
use crate::core::PeerId;
use crate::transport::{
    FramedChannel, InboundMessages, PeerEvent, PeerEvents, PeerFactory, Router,
};

/// Errors that can occur when driving a connector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// The connector task is no longer running.
    #[error("connector shut down")]
    Shutdown,
}

/// Receiving end of the `connection` event: one [`FramedChannel`] per
/// successful negotiation.
pub type ConnectionEvents = mpsc::UnboundedReceiver<FramedChannel>;

/// Commands queued from a [`ConnectorHandle`].
#[derive(Debug)]
pub(crate) enum Command {
    Connect(PeerId),
    Destroy,
}

/// Event queue of one attempt.
///
/// Yields a final [`PeerEvent::Close`] if the capability drops its sender,
/// so an abandoned capability still ends its attempt.
#[derive(Debug)]
struct AttemptEvents {
    rx: PeerEvents,
    finished: bool,
}

impl AttemptEvents {
    fn new(rx: PeerEvents) -> Self {
        Self {
            rx,
            finished: false,
        }
    }

    fn into_inner(self) -> PeerEvents {
        self.rx
    }
}

impl Stream for AttemptEvents {
    type Item = PeerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PeerEvent>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(Some(PeerEvent::Close))
            }
            other => other,
        }
    }
}

/// Negotiates peer-to-peer channels over a signaling [`Router`].
///
/// At most one attempt exists per remote peer. An inbound signal for a peer
/// with an attempt is fed into that attempt; otherwise it starts a responder
/// attempt. Local negotiation data is forwarded to the router in the order
/// the capability produced it.
///
/// # Example
///
/// ```ignore
/// use peer_link::prelude::*;
///
/// let (connector, mut connections) =
///     Connector::new(local_id, router, factory, ConnectorConfig::default());
/// let handle = connector.spawn();
///
/// handle.connect(remote_id)?;
/// while let Some(mut channel) = connections.recv().await {
///     channel.send(&json!({ "hello": channel.remote_id() }))?;
/// }
/// ```
pub struct Connector {
    /// Local peer id.
    local_id: PeerId,

    /// Configuration.
    config: ConnectorConfig,

    /// Signaling transport.
    router: Arc<dyn Router>,

    /// Router subscription.
    inbound: InboundMessages,

    /// Cleared when the router subscription ends.
    router_open: bool,

    /// Negotiation capability factory.
    factory: Arc<dyn PeerFactory>,

    /// In-flight attempts by remote peer.
    pending: HashMap<PeerId, NegotiationAttempt>,

    /// Event queues of in-flight attempts, keyed like `pending`.
    attempt_events: StreamMap<PeerId, AttemptEvents>,

    /// `connection` event sink.
    connections: mpsc::UnboundedSender<FramedChannel>,

    /// Command queue fed by handles. The connector's own sender is
    /// released when `run` starts so the queue closes with the last handle.
    commands_tx: Option<mpsc::UnboundedSender<Command>>,
    commands: mpsc::UnboundedReceiver<Command>,

    /// Cleared once every handle is gone.
    commands_open: bool,

    /// Set once by `destroy`.
    destroyed: bool,

    /// Shared with handles so they can short-circuit after destroy.
    destroyed_flag: Arc<AtomicBool>,
}

impl Connector {
    /// Create a connector and subscribe it to the router.
    ///
    /// Returns the connector and the queue its channels are delivered on.
    pub fn new(
        local_id: PeerId,
        router: Arc<dyn Router>,
        factory: Arc<dyn PeerFactory>,
        config: ConnectorConfig,
    ) -> (Self, ConnectionEvents) {
        let inbound = router.subscribe();
        let (connections, connection_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();

        if !factory.is_supported() {
            warn!(local = %local_id.short(), "peer connections not supported on this platform");
        }

        let connector = Self {
            local_id,
            config,
            router,
            inbound,
            router_open: true,
            factory,
            pending: HashMap::new(),
            attempt_events: StreamMap::new(),
            connections,
            commands_tx: Some(commands_tx),
            commands,
            commands_open: true,
            destroyed: false,
            destroyed_flag: Arc::new(AtomicBool::new(false)),
        };
        (connector, connection_rx)
    }

    /// The local peer id.
    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    /// The connector configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Whether the factory's connection technology is available.
    pub fn is_supported(&self) -> bool {
        self.factory.is_supported()
    }

    /// Check if the connector has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of in-flight attempts.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if an attempt for `remote` is in flight.
    pub fn is_pending(&self, remote: &PeerId) -> bool {
        self.pending.contains_key(remote)
    }

    /// The in-flight attempt for `remote`, if any.
    pub fn attempt(&self, remote: &PeerId) -> Option<&NegotiationAttempt> {
        self.pending.get(remote)
    }

    /// Remote peers with in-flight attempts.
    pub fn pending_peers(&self) -> Vec<PeerId> {
        self.pending.keys().copied().collect()
    }

    /// A control handle for use from other tasks.
    pub fn handle(&self) -> ConnectorHandle {
        // `None` only while `run` owns the connector; a closed queue makes
        // the handle report `Shutdown`.
        let commands = self
            .commands_tx
            .clone()
            .unwrap_or_else(|| mpsc::unbounded_channel().0);
        ConnectorHandle::new(self.local_id, commands, Arc::clone(&self.destroyed_flag))
    }

    /// Start an outbound attempt toward `remote`.
    ///
    /// No-op once destroyed, when an attempt for `remote` is already in
    /// flight, or when `remote` is the local id.
    pub fn connect(&mut self, remote: PeerId) {
        if self.destroyed {
            return;
        }
        if remote == self.local_id {
            warn!(local = %self.local_id.short(), "refusing to connect to self");
            return;
        }
        if self.pending.contains_key(&remote) {
            debug!(
                local = %self.local_id.short(),
                remote = %remote.short(),
                "attempt already pending, ignoring connect"
            );
            return;
        }
        debug!(local = %self.local_id.short(), remote = %remote.short(), "connecting");
        self.start_attempt(remote, Role::Initiator, None);
    }

    /// Handle a message delivered by the router.
    ///
    /// Messages other than signals are ignored.
    pub fn handle_message(&mut self, message: Value, from: PeerId) {
        if self.destroyed {
            return;
        }
        let data = match SignalingMessage::from_value(&message) {
            Ok(signal) => signal.into_data(),
            Err(_) => {
                trace!(local = %self.local_id.short(), from = %from.short(), "ignoring non-signal message");
                return;
            }
        };

        if let Some(attempt) = self.pending.get_mut(&from) {
            debug!(local = %self.local_id.short(), remote = %from.short(), "SIGNAL in");
            attempt.signal(data);
        } else {
            debug!(
                local = %self.local_id.short(),
                remote = %from.short(),
                "unsolicited signal, starting responder"
            );
            self.start_attempt(from, Role::Responder, Some(data));
        }
    }

    /// Handle an event from the capability of `remote`'s attempt.
    ///
    /// Events for peers without an attempt are dropped.
    pub fn handle_peer_event(&mut self, remote: PeerId, event: PeerEvent) {
        if self.destroyed {
            return;
        }
        let Some(attempt) = self.pending.get_mut(&remote) else {
            trace!(local = %self.local_id.short(), remote = %remote.short(), "event for unknown attempt");
            return;
        };

        match event {
            PeerEvent::Signal(data) => {
                attempt.on_local_signal();
                debug!(local = %self.local_id.short(), remote = %remote.short(), "SIGNAL out");
                match SignalingMessage::signal(data).to_value() {
                    Ok(message) => self.router.send(&remote, message),
                    Err(err) => warn!(remote = %remote.short(), %err, "failed to encode signal"),
                }
            }
            PeerEvent::Connect => self.establish(remote),
            PeerEvent::Close => self.abandon(remote),
            PeerEvent::Error(reason) => {
                warn!(local = %self.local_id.short(), remote = %remote.short(), %reason, "negotiation error");
                attempt.on_error(reason);
            }
            PeerEvent::Data(_) => {
                trace!(remote = %remote.short(), "dropping data received before connect");
            }
        }
    }

    /// Wait for the next event from any in-flight attempt.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_peer_event(&mut self) -> Option<(PeerId, PeerEvent)> {
        self.attempt_events.next().await
    }

    /// Destroy the connector. Idempotent.
    ///
    /// Every in-flight attempt is torn down. Channels already delivered are
    /// unaffected.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.destroyed_flag.store(true, Ordering::SeqCst);

        for (remote, mut attempt) in self.pending.drain() {
            debug!(local = %self.local_id.short(), remote = %remote.short(), "cancelling attempt");
            attempt.terminate();
        }
        self.attempt_events.clear();
        debug!(local = %self.local_id.short(), "connector destroyed");
    }

    /// Process commands, router messages, and attempt events until
    /// destroyed.
    ///
    /// Also stops once every [`ConnectorHandle`] and the [`ConnectionEvents`]
    /// receiver are dropped, since nothing could use its channels.
    pub async fn run(mut self) {
        debug!(local = %self.local_id.short(), "connector running");
        self.commands_tx = None;
        while !self.destroyed {
            tokio::select! {
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(Command::Connect(remote)) => self.connect(remote),
                    Some(Command::Destroy) => self.destroy(),
                    None => {
                        trace!(local = %self.local_id.short(), "all handles dropped");
                        self.commands_open = false;
                    }
                },
                _ = self.connections.closed(), if !self.commands_open => {
                    debug!(local = %self.local_id.short(), "no handles or listeners left");
                    self.destroy();
                },
                inbound = self.inbound.recv(), if self.router_open => match inbound {
                    Some((message, from)) => self.handle_message(message, from),
                    None => {
                        debug!(local = %self.local_id.short(), "router subscription ended");
                        self.router_open = false;
                    }
                },
                Some((remote, event)) = self.attempt_events.next(), if !self.attempt_events.is_empty() => {
                    self.handle_peer_event(remote, event);
                }
            }
        }
    }

    /// Run the connector on a new tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> ConnectorHandle {
        let handle = self.handle();
        tokio::spawn(self.run());
        handle
    }

    fn start_attempt(&mut self, remote: PeerId, role: Role, offer: Option<Value>) {
        let options = NegotiationAttempt::options(role, self.config.trickle);
        let (connection, events) = self.factory.create(options);

        let mut attempt = NegotiationAttempt::new(remote, role, connection);
        if let Some(offer) = offer {
            attempt.signal(offer);
        }
        attempt.begin();

        self.attempt_events.insert(remote, AttemptEvents::new(events));
        self.pending.insert(remote, attempt);
    }

    fn establish(&mut self, remote: PeerId) {
        let Some(mut attempt) = self.pending.remove(&remote) else {
            return;
        };
        let events = self.attempt_events.remove(&remote);

        let (Some(connection), Some(events)) = (attempt.establish(), events) else {
            warn!(remote = %remote.short(), "connect without a live capability");
            attempt.terminate();
            return;
        };

        debug!(
            local = %self.local_id.short(),
            remote = %remote.short(),
            role = ?attempt.role(),
            signals_sent = attempt.signals_sent(),
            "CONNECT"
        );
        let channel =
            FramedChannel::new(remote, connection, events.into_inner(), self.config.framing);
        if self.connections.send(channel).is_err() {
            debug!(remote = %remote.short(), "no listener for connections, dropping channel");
        }
    }

    fn abandon(&mut self, remote: PeerId) {
        self.attempt_events.remove(&remote);
        if let Some(mut attempt) = self.pending.remove(&remote) {
            attempt.close();
            debug!(
                local = %self.local_id.short(),
                remote = %remote.short(),
                last_error = attempt.last_error(),
                "CLOSE"
            );
        }
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.destroy();
    }
}
