//! peer-link transport layer.
//!
//! This module provides:
//!
//! - **Collaborator traits**: [`Router`], [`PeerFactory`], [`PeerConnection`]
//! - **Framed channel**: [`FramedChannel`], discrete messages over a raw
//!   duplex channel
//! - **Errors**: [`TransportError`], [`ChannelError`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Application                  │
//! ├─────────────────────────────────────────┤
//! │         FramedChannel                   │  ← This module
//! │   send / recv discrete messages         │
//! ├─────────────────────────────────────────┤
//! │         Framing (sentinels)             │
//! ├─────────────────────────────────────────┤
//! │    PeerConnection (raw duplex)          │
//! └─────────────────────────────────────────┘
//! ```

mod channel;
mod error;
mod traits;

pub use channel::*;
pub use error::*;
pub use traits::*;
