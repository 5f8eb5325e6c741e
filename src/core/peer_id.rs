//! Peer identifiers.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::constants::{PEER_ID_SHORT_BYTES, PEER_ID_SIZE};
use super::error::PeerIdError;

/// Opaque peer identifier (20 bytes).
///
/// Equality is byte-exact; the id is used as a map key by the connector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId([u8; PEER_ID_SIZE]);

impl PeerId {
    /// Create a peer id from bytes.
    pub const fn from_bytes(bytes: [u8; PEER_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a peer id from a slice of exactly [`PEER_ID_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PeerIdError> {
        let array: [u8; PEER_ID_SIZE] =
            bytes.try_into().map_err(|_| PeerIdError::InvalidLength {
                expected: PEER_ID_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Parse a peer id from hex.
    pub fn from_hex(text: &str) -> Result<Self, PeerIdError> {
        let bytes = hex::decode(text).map_err(|e| PeerIdError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Generate a random peer id.
    pub fn random() -> Self {
        let mut bytes = [0u8; PEER_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the peer id as bytes.
    pub fn as_bytes(&self) -> &[u8; PEER_ID_SIZE] {
        &self.0
    }

    /// Full lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex prefix used to tag log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..PEER_ID_SHORT_BYTES])
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_hex())
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for PeerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PEER_ID_SIZE]> for PeerId {
    fn from(bytes: [u8; PEER_ID_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<PeerId> for [u8; PEER_ID_SIZE] {
    fn from(id: PeerId) -> [u8; PEER_ID_SIZE] {
        id.0
    }
}

impl Serialize for PeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_hex_roundtrip() {
        let id = PeerId::from_bytes([0xAB; PEER_ID_SIZE]);
        let text = id.to_string();
        assert_eq!(text.len(), PEER_ID_SIZE * 2);
        assert_eq!(text.parse::<PeerId>().unwrap(), id);
    }

    #[test]
    fn test_peer_id_short_prefix() {
        let mut bytes = [0u8; PEER_ID_SIZE];
        bytes[0] = 0x12;
        bytes[1] = 0x34;
        bytes[2] = 0x56;
        assert_eq!(PeerId::from_bytes(bytes).short(), "1234");
    }

    #[test]
    fn test_peer_id_rejects_wrong_length() {
        assert_eq!(
            PeerId::from_slice(&[1, 2, 3]),
            Err(PeerIdError::InvalidLength {
                expected: PEER_ID_SIZE,
                actual: 3
            })
        );
        assert!(matches!(
            PeerId::from_hex("abcd"),
            Err(PeerIdError::InvalidLength { actual: 2, .. })
        ));
        assert!(matches!(
            PeerId::from_hex("zz"),
            Err(PeerIdError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_peer_id_random_differs() {
        assert_ne!(PeerId::random(), PeerId::random());
    }

    #[test]
    fn test_peer_id_serde_as_hex() {
        let id = PeerId::from_bytes([7; PEER_ID_SIZE]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
