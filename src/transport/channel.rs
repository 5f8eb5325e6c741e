//! Framed channel over an established raw duplex channel.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::error::{ChannelError, ChannelResult};
use super::traits::{PeerConnection, PeerEvent, PeerEvents};
use crate::core::PeerId;
use crate::framing::{Deframer, FramingConfig, Message, encode_frames};

/// Event surfaced to the owner of a [`FramedChannel`].
#[derive(Debug)]
pub enum ChannelEvent {
    /// A fully reassembled or passthrough message.
    Message(Message),
    /// The raw channel reported an error, or a received message could not
    /// be reassembled.
    Error(ChannelError),
}

/// A message-oriented channel to one remote peer.
///
/// Outbound messages are framed with start/end sentinels; inbound chunks are
/// reassembled by a [`Deframer`]. Once destroyed, the channel emits nothing
/// further and sends become no-ops.
///
/// # Example
///
/// ```ignore
/// channel.send(&json!({ "type": "ping" }))?;
///
/// while let Some(event) = channel.recv().await {
///     match event {
///         ChannelEvent::Message(msg) => handle(msg),
///         ChannelEvent::Error(err) => eprintln!("channel error: {err}"),
///     }
/// }
/// // Channel closed.
/// ```
pub struct FramedChannel {
    /// Remote peer.
    remote: PeerId,

    /// Raw channel, released on destroy.
    connection: Option<Box<dyn PeerConnection>>,

    /// Events from the raw channel.
    events: PeerEvents,

    /// Receive-side reassembly state.
    deframer: Deframer,

    /// Set once by `destroy`.
    destroyed: bool,
}

impl FramedChannel {
    /// Wrap an established raw channel.
    pub fn new(
        remote: PeerId,
        connection: Box<dyn PeerConnection>,
        events: PeerEvents,
        config: FramingConfig,
    ) -> Self {
        Self {
            remote,
            connection: Some(connection),
            events,
            deframer: Deframer::new(config),
            destroyed: false,
        }
    }

    /// The remote peer's id.
    pub fn remote_id(&self) -> PeerId {
        self.remote
    }

    /// Check if the channel has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Frame and send a message.
    ///
    /// Returns `Ok(())` without sending if the channel is destroyed. A
    /// failure after the start sentinel went out destroys the channel.
    pub fn send<T: Serialize + ?Sized>(&mut self, message: &T) -> ChannelResult<()> {
        if self.destroyed {
            return Ok(());
        }
        let Some(connection) = self.connection.as_mut() else {
            return Ok(());
        };

        let frames = encode_frames(message)?;
        trace!(remote = %self.remote.short(), bytes = frames[1].len(), "send framed message");
        let failure = frames
            .into_iter()
            .enumerate()
            .find_map(|(index, chunk)| connection.send(chunk).err().map(|err| (index, err)));

        let Some((index, err)) = failure else {
            return Ok(());
        };
        let err = ChannelError::from(err);
        // Past the start sentinel the remote is mid-frame; it can't resync.
        if index > 0 || err.is_fatal() {
            warn!(remote = %self.remote.short(), %err, chunk = index, "send failed, dropping channel");
            self.destroy();
        }
        Err(err)
    }

    /// Apply one raw channel event.
    ///
    /// Returns the event to surface, if any. A reassembly failure yields one
    /// error and destroys the channel.
    pub fn handle_event(&mut self, event: PeerEvent) -> Option<ChannelEvent> {
        if self.destroyed {
            return None;
        }

        match event {
            PeerEvent::Data(chunk) => match self.deframer.push(chunk) {
                Ok(message) => message.map(ChannelEvent::Message),
                Err(err) => {
                    warn!(remote = %self.remote.short(), %err, "dropping channel");
                    self.destroy();
                    Some(ChannelEvent::Error(err.into()))
                }
            },
            PeerEvent::Close => {
                debug!(remote = %self.remote.short(), "channel closed by transport");
                self.destroy();
                None
            }
            PeerEvent::Error(reason) => Some(ChannelEvent::Error(ChannelError::Remote(reason))),
            PeerEvent::Signal(_) | PeerEvent::Connect => {
                trace!(remote = %self.remote.short(), "ignoring negotiation event on open channel");
                None
            }
        }
    }

    /// Wait for the next message or error.
    ///
    /// Returns `None` once the channel is destroyed. A capability that drops
    /// its event queue is treated as closed.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        loop {
            if self.destroyed {
                return None;
            }
            let Some(event) = self.events.recv().await else {
                self.destroy();
                return None;
            };
            if let Some(out) = self.handle_event(event) {
                return Some(out);
            }
        }
    }

    /// Destroy the channel and the underlying raw channel. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.deframer.reset();
        self.events.close();
        if let Some(mut connection) = self.connection.take() {
            connection.destroy();
        }
        debug!(remote = %self.remote.short(), "channel destroyed");
    }
}

impl fmt::Debug for FramedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedChannel")
            .field("remote", &self.remote)
            .field("destroyed", &self.destroyed)
            .field("deframer", &self.deframer)
            .finish_non_exhaustive()
    }
}

impl Drop for FramedChannel {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{END_SENTINEL, START_SENTINEL};
    use crate::testing::{RecordedPeer, RecordingConnection};
    use crate::transport::TransportError;
    use bytes::Bytes;
    use serde_json::json;

    fn channel() -> (FramedChannel, RecordedPeer) {
        let (connection, peer, events) = RecordingConnection::new();
        let channel = FramedChannel::new(
            PeerId::random(),
            Box::new(connection),
            events,
            FramingConfig::default(),
        );
        (channel, peer)
    }

    fn data(bytes: &'static [u8]) -> PeerEvent {
        PeerEvent::Data(Bytes::from_static(bytes))
    }

    #[test]
    fn test_send_writes_three_chunks() {
        let (mut channel, peer) = channel();
        channel.send(&json!({ "op": "hello" })).unwrap();

        let sent = peer.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(&sent[0][..], &START_SENTINEL);
        assert_eq!(&sent[1][..], br#"{"op":"hello"}"#);
        assert_eq!(&sent[2][..], &END_SENTINEL);
    }

    #[test]
    fn test_send_after_destroy_is_noop() {
        let (mut channel, peer) = channel();
        channel.destroy();
        channel.send("late").unwrap();
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_failure_mid_frame_destroys_channel() {
        let (mut channel, peer) = channel();
        peer.accept_only(1);

        let err = channel.send("first").unwrap_err();
        assert!(matches!(err, ChannelError::Transport(TransportError::Send(_))));
        assert!(channel.is_destroyed());
        assert!(peer.is_destroyed());

        // Nothing more reaches the remote, so it never sees a torn frame
        // followed by a fresh one.
        channel.send("second").unwrap();
        let mut deframer = Deframer::default();
        for chunk in peer.sent() {
            assert!(deframer.push(chunk).unwrap().is_none());
        }
        assert!(deframer.is_open());
    }

    #[test]
    fn test_rejected_first_chunk_keeps_channel() {
        let (mut channel, peer) = channel();
        peer.accept_only(0);

        assert!(channel.send("dropped").is_err());
        assert!(!channel.is_destroyed());
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_framed_sequence_yields_one_message() {
        let (mut channel, _peer) = channel();
        assert!(channel.handle_event(data(&START_SENTINEL)).is_none());
        assert!(channel.handle_event(data(b"\"ab")).is_none());
        assert!(channel.handle_event(data(b"cd\"")).is_none());
        match channel.handle_event(data(&END_SENTINEL)) {
            Some(ChannelEvent::Message(msg)) => assert_eq!(msg, Message::Json(json!("abcd"))),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unframed_chunk_is_emitted_verbatim() {
        let (mut channel, _peer) = channel();
        match channel.handle_event(data(b"plain")) {
            Some(ChannelEvent::Message(Message::Raw(raw))) => assert_eq!(&raw[..], b"plain"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_remote_error_is_surfaced() {
        let (mut channel, _peer) = channel();
        let event = channel.handle_event(PeerEvent::Error("ice failed".into()));
        assert!(matches!(
            event,
            Some(ChannelEvent::Error(ChannelError::Remote(reason))) if reason == "ice failed"
        ));
        assert!(!channel.is_destroyed());
    }

    #[test]
    fn test_close_destroys_without_error() {
        let (mut channel, peer) = channel();
        assert!(channel.handle_event(PeerEvent::Close).is_none());
        assert!(channel.is_destroyed());
        assert!(peer.is_destroyed());
    }

    #[test]
    fn test_malformed_message_fails_channel() {
        let (mut channel, peer) = channel();
        channel.handle_event(data(&START_SENTINEL));
        channel.handle_event(data(b"{not json"));
        let event = channel.handle_event(data(&END_SENTINEL));
        assert!(matches!(event, Some(ChannelEvent::Error(ChannelError::Framing(_)))));
        assert!(channel.is_destroyed());
        assert!(peer.is_destroyed());
    }

    #[test]
    fn test_destroyed_channel_is_silent() {
        let (mut channel, peer) = channel();
        channel.destroy();
        channel.destroy();
        assert!(peer.is_destroyed());
        assert_eq!(peer.destroy_count(), 1);
        assert!(channel.handle_event(data(b"plain")).is_none());
        assert!(channel.handle_event(PeerEvent::Error("late".into())).is_none());
    }

    #[test]
    fn test_drop_destroys_connection() {
        let (channel, peer) = channel();
        drop(channel);
        assert!(peer.is_destroyed());
    }

    #[tokio::test]
    async fn test_recv_reassembles_queued_chunks() {
        let (mut channel, peer) = channel();
        peer.emit(data(b"raw"));
        peer.emit(data(&START_SENTINEL));
        peer.emit(data(b"[1,"));
        peer.emit(data(b"2]"));
        peer.emit(data(&END_SENTINEL));
        peer.emit(PeerEvent::Close);

        let mut messages = Vec::new();
        while let Some(event) = channel.recv().await {
            match event {
                ChannelEvent::Message(msg) => messages.push(msg),
                ChannelEvent::Error(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!(
            messages,
            vec![
                Message::Raw(Bytes::from_static(b"raw")),
                Message::Json(json!([1, 2])),
            ]
        );
        assert!(channel.is_destroyed());
    }

    #[tokio::test]
    async fn test_recv_ends_when_events_dropped() {
        let (mut channel, peer) = channel();
        peer.close_events();
        assert!(channel.recv().await.is_none());
        assert!(channel.is_destroyed());
    }
}
