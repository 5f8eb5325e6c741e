//! Sentinel-delimited message framing.
//!
//! The framing layer sits directly on a raw duplex channel. It gives the
//! channel explicit message boundaries regardless of payload size:
//!
//! - [`encode_frames`]: serialize a message into start, payload, end chunks
//! - [`Deframer`]: reassemble received chunks into [`Message`]s
//!
//! Both halves are free of I/O and usable without an async runtime.

mod codec;
mod config;
mod deframer;
mod message;

pub use codec::{encode_frames, is_end, is_start};
pub use config::FramingConfig;
pub use deframer::Deframer;
pub use message::Message;
