//! Core identifiers, constants, and error types.

pub mod constants;
mod error;
mod peer_id;

pub use error::*;
pub use peer_id::PeerId;
