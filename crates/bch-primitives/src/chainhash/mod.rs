//! Chain hash type for transaction identification.
//!
//! A `Hash` stores 32 bytes in internal byte order. Block explorers display
//! (and return) transaction ids byte-reversed, so `from_hex` reverses the
//! decoded bytes and `Display` reverses them back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Size of a Hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A 32-byte hash in internal byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from a raw 32-byte array in internal byte order.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a byte slice in internal byte order.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash)` if the slice is 32 bytes, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            )));
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }

    /// Create a Hash from a display-order hex string (as returned by explorers).
    ///
    /// The hex is decoded and the resulting bytes reversed into internal
    /// order. The string must encode exactly 32 bytes.
    ///
    /// # Arguments
    /// * `hex_str` - A 64-character hex string in display order.
    ///
    /// # Returns
    /// `Ok(Hash)` on success, or an error for invalid hex or length.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let mut bytes = hex::decode(hex_str.trim())?;
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "txid '{}' decodes to {} bytes, want {}",
                hex_str,
                bytes.len(),
                HASH_SIZE
            )));
        }
        bytes.reverse();
        Self::from_bytes(&bytes)
    }

    /// Create a Hash from a hex string that is already in internal order.
    pub fn from_internal_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Return the hash with its bytes reversed.
    ///
    /// Reversal is an involution: `h.reversed().reversed() == h`.
    pub fn reversed(&self) -> Self {
        let mut bytes = self.0;
        bytes.reverse();
        Hash(bytes)
    }

    /// Access the internal byte array.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hex of the internal byte order (not the display order).
    pub fn to_internal_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Display the hash as byte-reversed hex (explorer convention).
impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.reversed().0))
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

/// Serialize as a display-order hex string.
impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute SHA-256d of the input and return it as a Hash.
pub fn double_hash_h(data: &[u8]) -> Hash {
    Hash(sha256d(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_COINBASE_TXID: &str =
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn test_from_hex_reverses_bytes() {
        let h = Hash::from_hex(GENESIS_COINBASE_TXID).unwrap();
        assert_eq!(h.as_bytes()[0], 0x3b);
        assert_eq!(h.as_bytes()[31], 0x4a);
        assert_eq!(
            h.to_internal_hex(),
            "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a"
        );
    }

    #[test]
    fn test_display_roundtrip() {
        let h = Hash::from_hex(GENESIS_COINBASE_TXID).unwrap();
        assert_eq!(h.to_string(), GENESIS_COINBASE_TXID);
    }

    #[test]
    fn test_reversed_twice_is_identity() {
        let h = Hash::from_hex(GENESIS_COINBASE_TXID).unwrap();
        assert_eq!(h.reversed().reversed(), h);
        assert_ne!(h.reversed(), h);
    }

    #[test]
    fn test_from_hex_rejects_short_and_bad_hex() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("zz").is_err());
        assert!(Hash::from_hex("").is_err());
    }

    #[test]
    fn test_serde_uses_display_order() {
        let h = Hash::from_hex(GENESIS_COINBASE_TXID).unwrap();
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", GENESIS_COINBASE_TXID));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
