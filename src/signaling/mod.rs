//! peer-link signaling layer.
//!
//! Turns signaling exchanges over a [`Router`] into established
//! [`FramedChannel`]s:
//!
//! - [`Connector`]: owns every in-flight [`NegotiationAttempt`], keyed by
//!   remote peer, and surfaces channels as they become ready
//! - [`ConnectorHandle`]: cloneable control handle for a spawned connector
//! - [`SignalingMessage`]: the `{"type":"signal","data":...}` envelope
//!
//! # Flow
//!
//! ```text
//!   connect(B) ─▶ initiator attempt ─signal─▶ Router ─▶ B
//!                                                       │ no attempt for A:
//!                                                       ▼ responder attempt
//!   A ◀─ Router ◀─signal─ ... ─▶ connect ─▶ FramedChannel on both sides
//! ```
//!
//! [`Router`]: crate::transport::Router
//! [`FramedChannel`]: crate::transport::FramedChannel

mod attempt;
mod config;
mod connector;
mod handle;
mod message;

pub use attempt::*;
pub use config::*;
pub use connector::{ConnectionEvents, Connector, ConnectorError};
pub use handle::ConnectorHandle;
pub use message::SignalingMessage;
