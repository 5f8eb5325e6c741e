//! Error types for peer-link.

use thiserror::Error;

/// Errors that can occur when parsing a peer identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerIdError {
    /// Wrong number of bytes.
    #[error("invalid peer id length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Hex text could not be decoded.
    #[error("invalid peer id hex: {0}")]
    InvalidHex(String),
}

/// Errors in the framing layer.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// A reassembled payload did not parse.
    #[error("malformed framed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Reassembly buffer grew past the configured ceiling.
    #[error("framed message too large: {size} bytes exceeds limit of {limit}")]
    MessageTooLarge {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Top-level peer-link errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Peer id error.
    #[error("peer id error: {0}")]
    PeerId(#[from] PeerIdError),

    /// Framing error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Channel error.
    #[cfg(feature = "transport")]
    #[error("channel error: {0}")]
    Channel(#[from] crate::transport::ChannelError),

    /// Connector error.
    #[cfg(feature = "signaling")]
    #[error("connector error: {0}")]
    Connector(#[from] crate::signaling::ConnectorError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
