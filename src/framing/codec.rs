//! Send-side framing.
//!
//! A message is serialized to JSON text and written as three chunks:
//!
//! ```text
//! +-----------+---------------------+-----------+
//! | F0 0D     | JSON payload        | CA FE     |
//! | (start)   | (one chunk)         | (end)     |
//! +-----------+---------------------+-----------+
//! ```
//!
//! Neither sentinel is valid UTF-8, so a serialized payload chunk can never
//! be mistaken for one.

use bytes::Bytes;
use serde::Serialize;

use crate::core::FramingError;
use crate::core::constants::{CHUNKS_PER_MESSAGE, END_SENTINEL, START_SENTINEL};

/// Check if a chunk is exactly the start sentinel.
pub fn is_start(chunk: &[u8]) -> bool {
    chunk == &START_SENTINEL[..]
}

/// Check if a chunk is exactly the end sentinel.
pub fn is_end(chunk: &[u8]) -> bool {
    chunk == &END_SENTINEL[..]
}

/// Serialize `message` and produce the chunk sequence to write, in order.
pub fn encode_frames<T: Serialize + ?Sized>(
    message: &T,
) -> Result<[Bytes; CHUNKS_PER_MESSAGE], FramingError> {
    let payload = serde_json::to_vec(message).map_err(FramingError::Encode)?;
    Ok([
        Bytes::from_static(&START_SENTINEL),
        Bytes::from(payload),
        Bytes::from_static(&END_SENTINEL),
    ])
}
