//! Negotiation attempt state.
//!
//! One attempt exists per remote peer while a connection is being set up.
//!
//! ```text
//! Created ──begin──▶ Negotiating ──establish──▶ Established
//!                         │
//!                         └────close / terminate──▶ Closed
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::core::PeerId;
use crate::transport::{PeerConnection, PeerOptions};

/// Which side of the negotiation this attempt plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Created by a local `connect`.
    Initiator,
    /// Created in reaction to an unsolicited inbound signal.
    Responder,
}

impl Role {
    /// Check if this side starts the negotiation.
    pub fn is_initiator(self) -> bool {
        self == Role::Initiator
    }
}

/// Attempt lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Capability constructed, not yet wired.
    Created,
    /// Exchanging negotiation data with the remote peer.
    Negotiating,
    /// Negotiation succeeded and the channel was handed off.
    Established,
    /// Negotiation failed, was abandoned, or was torn down.
    Closed,
}

impl AttemptPhase {
    /// Check if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptPhase::Established | AttemptPhase::Closed)
    }
}

/// An in-flight connection setup with one remote peer.
pub struct NegotiationAttempt {
    /// Remote peer.
    remote: PeerId,
    /// Initiator or responder.
    role: Role,
    /// Lifecycle state.
    phase: AttemptPhase,
    /// Negotiation capability, released on establish or close.
    connection: Option<Box<dyn PeerConnection>>,
    /// Local negotiation data forwarded to the remote peer.
    signals_sent: u64,
    /// Remote negotiation data fed into the capability.
    signals_received: u64,
    /// Most recent capability error, kept for diagnostics.
    last_error: Option<String>,
    /// Creation time.
    created_at: Instant,
}

impl NegotiationAttempt {
    /// Create an attempt in the `Created` phase.
    pub fn new(remote: PeerId, role: Role, connection: Box<dyn PeerConnection>) -> Self {
        Self {
            remote,
            role,
            phase: AttemptPhase::Created,
            connection: Some(connection),
            signals_sent: 0,
            signals_received: 0,
            last_error: None,
            created_at: Instant::now(),
        }
    }

    /// Capability options for a role.
    pub fn options(role: Role, trickle: bool) -> PeerOptions {
        PeerOptions {
            initiator: role.is_initiator(),
            trickle,
        }
    }

    /// Remote peer.
    pub fn remote(&self) -> PeerId {
        self.remote
    }

    /// Attempt role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current phase.
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    /// Local negotiation messages forwarded so far.
    pub fn signals_sent(&self) -> u64 {
        self.signals_sent
    }

    /// Remote negotiation messages fed in so far.
    pub fn signals_received(&self) -> u64 {
        self.signals_received
    }

    /// Most recent capability error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time since creation.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Transition `Created` to `Negotiating`.
    pub fn begin(&mut self) {
        if self.phase == AttemptPhase::Created {
            self.phase = AttemptPhase::Negotiating;
        }
    }

    /// Feed remote negotiation data into the capability.
    ///
    /// Ignored once the attempt is terminal.
    pub fn signal(&mut self, data: Value) {
        if self.phase.is_terminal() {
            return;
        }
        if let Some(connection) = self.connection.as_mut() {
            connection.signal(data);
            self.signals_received += 1;
        }
    }

    /// Count one local negotiation message forwarded to the remote peer.
    pub fn on_local_signal(&mut self) {
        self.signals_sent += 1;
    }

    /// Record a capability error. Does not change the phase.
    pub fn on_error(&mut self, reason: String) {
        self.last_error = Some(reason);
    }

    /// Transition to `Established`, releasing the capability as a raw channel.
    ///
    /// Returns `None` unless the attempt was negotiating.
    pub fn establish(&mut self) -> Option<Box<dyn PeerConnection>> {
        if self.phase != AttemptPhase::Negotiating {
            return None;
        }
        self.phase = AttemptPhase::Established;
        self.connection.take()
    }

    /// Transition to `Closed` after the capability reported close.
    pub fn close(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = AttemptPhase::Closed;
        self.connection = None;
    }

    /// Force the attempt closed, destroying the capability.
    pub fn terminate(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.destroy();
        }
        if !self.phase.is_terminal() {
            self.phase = AttemptPhase::Closed;
        }
    }
}

impl fmt::Debug for NegotiationAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationAttempt")
            .field("remote", &self.remote)
            .field("role", &self.role)
            .field("phase", &self.phase)
            .field("signals_sent", &self.signals_sent)
            .field("signals_received", &self.signals_received)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingConnection;
    use serde_json::json;

    fn attempt(role: Role) -> (NegotiationAttempt, crate::testing::RecordedPeer) {
        let (connection, peer, _events) = RecordingConnection::new();
        (
            NegotiationAttempt::new(PeerId::random(), role, Box::new(connection)),
            peer,
        )
    }

    #[test]
    fn test_attempt_lifecycle_established() {
        let (mut attempt, _peer) = attempt(Role::Initiator);
        assert_eq!(attempt.phase(), AttemptPhase::Created);

        // Cannot establish before negotiating.
        assert!(attempt.establish().is_none());

        attempt.begin();
        assert_eq!(attempt.phase(), AttemptPhase::Negotiating);
        assert!(attempt.establish().is_some());
        assert_eq!(attempt.phase(), AttemptPhase::Established);

        // Terminal.
        attempt.close();
        assert_eq!(attempt.phase(), AttemptPhase::Established);
        assert!(attempt.establish().is_none());
    }

    #[test]
    fn test_attempt_signal_feeds_capability() {
        let (mut attempt, peer) = attempt(Role::Responder);
        attempt.signal(json!("offer"));
        attempt.begin();
        attempt.signal(json!("candidate"));
        assert_eq!(peer.signals(), vec![json!("offer"), json!("candidate")]);
        assert_eq!(attempt.signals_received(), 2);

        attempt.close();
        attempt.signal(json!("late"));
        assert_eq!(peer.signals().len(), 2);
    }

    #[test]
    fn test_attempt_error_is_diagnostic_only() {
        let (mut attempt, _peer) = attempt(Role::Initiator);
        attempt.begin();
        attempt.on_error("ice gathering failed".into());
        assert_eq!(attempt.phase(), AttemptPhase::Negotiating);
        assert_eq!(attempt.last_error(), Some("ice gathering failed"));
    }

    #[test]
    fn test_attempt_terminate_destroys() {
        let (mut attempt, peer) = attempt(Role::Initiator);
        attempt.begin();
        attempt.terminate();
        assert_eq!(attempt.phase(), AttemptPhase::Closed);
        assert!(peer.is_destroyed());
        attempt.terminate();
        assert_eq!(peer.destroy_count(), 1);
    }

    #[test]
    fn test_options_follow_role() {
        assert!(NegotiationAttempt::options(Role::Initiator, true).initiator);
        assert!(!NegotiationAttempt::options(Role::Responder, false).initiator);
        assert!(!NegotiationAttempt::options(Role::Responder, false).trickle);
    }
}
