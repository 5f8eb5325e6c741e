//! Receive-side reassembly.
//!
//! Converts an ordered stream of raw chunks back into discrete messages.
//! The deframer performs no I/O; callers feed it one chunk at a time.

use bytes::Bytes;

use super::codec::{is_end, is_start};
use super::config::FramingConfig;
use super::message::Message;
use crate::core::FramingError;

/// Chunk reassembly state for one channel.
///
/// The buffer is `None` between messages. It opens on a start sentinel,
/// collects payload chunks in arrival order, and closes on an end sentinel.
#[derive(Debug)]
pub struct Deframer {
    /// Open reassembly buffer, absent when not mid-message.
    buffer: Option<Vec<Bytes>>,
    /// Payload bytes held in `buffer`.
    buffered_bytes: usize,
    /// Ceiling on `buffered_bytes`.
    max_message_bytes: usize,
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new(FramingConfig::default())
    }
}

impl Deframer {
    /// Create a deframer with the given limits.
    pub fn new(config: FramingConfig) -> Self {
        Self {
            buffer: None,
            buffered_bytes: 0,
            max_message_bytes: config.max_message_bytes,
        }
    }

    /// Feed one chunk.
    ///
    /// Returns `Ok(Some(_))` when the chunk completes a message (or is a
    /// passthrough chunk) and `Ok(None)` when it was consumed as framing.
    /// On error the partial buffer is discarded.
    pub fn push(&mut self, chunk: Bytes) -> Result<Option<Message>, FramingError> {
        if self.buffer.is_none() {
            if is_start(&chunk) {
                self.buffer = Some(Vec::new());
                return Ok(None);
            }
            return Ok(Some(Message::Raw(chunk)));
        }

        if is_end(&chunk) {
            let chunks = self.buffer.take().unwrap_or_default();
            let mut payload = Vec::with_capacity(self.buffered_bytes);
            for part in &chunks {
                payload.extend_from_slice(part);
            }
            self.buffered_bytes = 0;
            let value = serde_json::from_slice(&payload).map_err(FramingError::Malformed)?;
            return Ok(Some(Message::Json(value)));
        }

        let size = self.buffered_bytes.saturating_add(chunk.len());
        if size > self.max_message_bytes {
            self.reset();
            return Err(FramingError::MessageTooLarge {
                size,
                limit: self.max_message_bytes,
            });
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(chunk);
        }
        self.buffered_bytes = size;
        Ok(None)
    }

    /// Check if a message is mid-reassembly.
    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// Number of payload chunks buffered for the open message.
    pub fn buffered_chunks(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    /// Payload bytes buffered for the open message.
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    /// Drop any partial message.
    pub fn reset(&mut self) {
        self.buffer = None;
        self.buffered_bytes = 0;
    }
}
