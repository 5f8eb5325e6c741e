//! # peer-link
//!
//! Peer-to-peer data channels negotiated over a signaling router.
//!
//! A [`Connector`] exchanges negotiation data with remote peers through a
//! pluggable [`Router`] and, once a raw channel connects, hands it back
//! wrapped in a [`FramedChannel`] that delivers whole messages:
//!
//! - **Negotiation**: at most one attempt per remote peer, initiator or
//!   responder, with negotiation data relayed in order
//! - **Framing**: every message travels as start sentinel, JSON payload,
//!   end sentinel; chunks outside a frame pass through as raw messages
//! - **Pluggable**: routers and negotiation capabilities are traits, with
//!   in-memory doubles under [`testing`]
//!
//! ## Feature Flags
//!
//! - `transport` (default): collaborator traits and [`FramedChannel`]
//! - `signaling` (default): [`Connector`] and [`ConnectorHandle`]
//! - `testing`: in-memory router, loopback capability, tracing setup
//!
//! ## Modules
//!
//! - [`core`]: identifiers, constants, and error types (always included)
//! - [`framing`]: sentinel framing and reassembly (always included)
//! - [`transport`]: framed channels (requires `transport` feature)
//! - [`signaling`]: connection negotiation (requires `signaling` feature)
//!
//! ## Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use peer_link::prelude::*;
//!
//! let (connector, mut connections) = Connector::new(
//!     local_id,
//!     Arc::new(router),
//!     Arc::new(factory),
//!     ConnectorConfig::from_env(),
//! );
//! let handle = connector.spawn();
//! handle.connect(remote_id)?;
//!
//! let mut channel = connections.recv().await.expect("connector running");
//! channel.send(&serde_json::json!({ "hello": "world" }))?;
//! while let Some(ChannelEvent::Message(msg)) = channel.recv().await {
//!     println!("{:?}", msg.as_json());
//! }
//! ```
//!
//! [`Connector`]: signaling::Connector
//! [`ConnectorHandle`]: signaling::ConnectorHandle
//! [`Router`]: transport::Router
//! [`FramedChannel`]: transport::FramedChannel

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Framing codec (always included, sans-IO)
pub mod framing;

// Framed channels and collaborator traits (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Connection negotiation (feature-gated)
#[cfg(feature = "signaling")]
#[cfg_attr(docsrs, doc(cfg(feature = "signaling")))]
pub mod signaling;

// Test doubles (feature-gated)
#[cfg(all(feature = "transport", any(test, feature = "testing")))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use crate::core::*;

    // Framing
    pub use crate::framing::{Deframer, FramingConfig, Message};

    // Transport types (when enabled)
    #[cfg(feature = "transport")]
    pub use crate::transport::{
        ChannelError, ChannelEvent, FramedChannel, PeerConnection, PeerEvent, PeerFactory,
        PeerOptions, Router, TransportError,
    };

    // Signaling types (when enabled)
    #[cfg(feature = "signaling")]
    pub use crate::signaling::{
        ConnectionEvents, Connector, ConnectorBuilder, ConnectorConfig, ConnectorError,
        ConnectorHandle,
    };
}

// Re-export commonly used items at crate root
pub use core::{Error, PeerId};
pub use framing::Message;

#[cfg(feature = "transport")]
pub use transport::{ChannelEvent, FramedChannel, PeerEvent};

#[cfg(feature = "signaling")]
pub use signaling::{Connector, ConnectorConfig, ConnectorHandle};
