//! Transport layer error types.

use thiserror::Error;

use crate::core::FramingError;

/// Errors reported by a raw duplex channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The channel is closed or destroyed.
    #[error("channel closed")]
    Closed,

    /// The channel rejected a chunk.
    #[error("send failed: {0}")]
    Send(String),
}

/// Errors surfaced by a framed channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Framing failed on send or receive.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The raw channel failed a local operation.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The raw channel reported an error event.
    #[error("remote channel error: {0}")]
    Remote(String),
}

impl ChannelError {
    /// Check if this error tears the channel down.
    ///
    /// Receive-side framing failures and closed transports are fatal;
    /// an encode failure only affects the message being sent.
    pub fn is_fatal(&self) -> bool {
        match self {
            ChannelError::Framing(FramingError::Encode(_)) => false,
            ChannelError::Framing(_) => true,
            ChannelError::Transport(TransportError::Closed) => true,
            ChannelError::Transport(TransportError::Send(_)) => false,
            ChannelError::Remote(_) => false,
        }
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
