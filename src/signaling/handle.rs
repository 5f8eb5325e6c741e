//! Cloneable control handle for a spawned connector.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use super::connector::{Command, ConnectorError};
use crate::core::PeerId;

/// Handle for driving a [`Connector`] running on its own task.
///
/// Commands are queued to the connector task, so the attempt map is only
/// ever touched by that task.
///
/// [`Connector`]: super::Connector
#[derive(Debug, Clone)]
pub struct ConnectorHandle {
    local_id: PeerId,
    commands: mpsc::UnboundedSender<Command>,
    destroyed: Arc<AtomicBool>,
}

impl ConnectorHandle {
    pub(crate) fn new(
        local_id: PeerId,
        commands: mpsc::UnboundedSender<Command>,
        destroyed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            local_id,
            commands,
            destroyed,
        }
    }

    /// The local peer id.
    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    /// Start negotiating a channel to `remote`.
    ///
    /// No-op once destroyed. Fails if the connector task is gone.
    pub fn connect(&self, remote: PeerId) -> Result<(), ConnectorError> {
        if self.is_destroyed() {
            return Ok(());
        }
        self.commands
            .send(Command::Connect(remote))
            .map_err(|_| ConnectorError::Shutdown)
    }

    /// Destroy the connector and every pending attempt. Idempotent.
    ///
    /// Channels already handed out are unaffected.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.commands.send(Command::Destroy).is_err() {
            debug!(local = %self.local_id.short(), "connector task already stopped");
        }
    }

    /// Check if the connector has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
