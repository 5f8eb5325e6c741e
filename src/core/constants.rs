//! Protocol constants for peer-link.
//!
//! The sentinel values are part of the wire format and MUST NOT be changed.

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Peer identifier size in bytes.
pub const PEER_ID_SIZE: usize = 20;

/// Number of leading id bytes shown in log prefixes.
pub const PEER_ID_SHORT_BYTES: usize = 2;

// =============================================================================
// FRAMING SENTINELS
// =============================================================================

/// Sentinel length in bytes.
pub const SENTINEL_SIZE: usize = 2;

/// Chunk that opens a framed message.
pub const START_SENTINEL: [u8; SENTINEL_SIZE] = [0xF0, 0x0D];

/// Chunk that closes a framed message.
pub const END_SENTINEL: [u8; SENTINEL_SIZE] = [0xCA, 0xFE];

/// Number of raw chunks emitted per framed message (start, payload, end).
pub const CHUNKS_PER_MESSAGE: usize = 3;

// =============================================================================
// REASSEMBLY LIMITS
// =============================================================================

/// Default ceiling on a reassembled message.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Smallest accepted `max_message_bytes` setting.
pub const MIN_MAX_MESSAGE_BYTES: usize = 1024;

/// Environment variable overriding the reassembly ceiling.
pub const MAX_MESSAGE_BYTES_ENV: &str = "PEER_LINK_MAX_MESSAGE_BYTES";

// =============================================================================
// SIGNALING
// =============================================================================

/// Envelope `type` for negotiation data carried over the router.
pub const SIGNAL_MESSAGE_TYPE: &str = "signal";

/// Trickle signaling is enabled unless configured otherwise.
pub const DEFAULT_TRICKLE: bool = true;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(START_SENTINEL, END_SENTINEL);
        assert_eq!(START_SENTINEL.len(), SENTINEL_SIZE);
        assert_eq!(END_SENTINEL.len(), SENTINEL_SIZE);
    }

    #[test]
    fn test_sentinels_are_not_utf8() {
        // Serialized payloads are always UTF-8, so they can never collide
        // with a sentinel chunk.
        assert!(String::from_utf8(START_SENTINEL.to_vec()).is_err());
        assert!(String::from_utf8(END_SENTINEL.to_vec()).is_err());
    }
}
