//! secp256k1 private key with WIF import and export.
//!
//! A key remembers whether its WIF carried the compression flag, since that
//! decides which public key serialization (and therefore which address) the
//! key controls. It also remembers the WIF version byte so `to_wif` round-trips.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::signature::Signature;
use crate::hash::sha256d;
use crate::PrimitivesError;

/// Mainnet WIF version byte.
pub const MAINNET_WIF_PREFIX: u8 = 0x80;

/// Testnet WIF version byte.
pub const TESTNET_WIF_PREFIX: u8 = 0xef;

const PRIVATE_KEY_BYTES_LEN: usize = 32;
const COMPRESS_MAGIC: u8 = 0x01;

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
    wif_prefix: u8,
}

impl PrivateKey {
    /// Generate a random compressed key for mainnet.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
            wif_prefix: MAINNET_WIF_PREFIX,
        }
    }

    /// Create a compressed key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - Big-endian scalar, exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the scalar is in range and non-zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey {
            inner,
            compressed: true,
            wif_prefix: MAINNET_WIF_PREFIX,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Decode a Base58Check WIF string.
    ///
    /// Accepts both the 37-byte (uncompressed) and 38-byte (compressed)
    /// payload forms. The version byte is kept as-is and is not checked
    /// against a network.
    ///
    /// # Arguments
    /// * `wif` - The WIF string.
    ///
    /// # Returns
    /// `Ok(PrivateKey)`, or `InvalidWif` / `ChecksumMismatch`.
    pub fn from_wif(wif: &str) -> Result<Self, PrimitivesError> {
        let decoded = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| PrimitivesError::InvalidWif(e.to_string()))?;

        let compressed = match decoded.len() {
            38 if decoded[33] == COMPRESS_MAGIC => true,
            38 => {
                return Err(PrimitivesError::InvalidWif(
                    "invalid compression flag".to_string(),
                ))
            }
            37 => false,
            n => {
                return Err(PrimitivesError::InvalidWif(format!(
                    "invalid payload length {}",
                    n
                )))
            }
        };

        let (payload, checksum) = decoded.split_at(decoded.len() - 4);
        if sha256d(payload)[..4] != *checksum {
            return Err(PrimitivesError::ChecksumMismatch);
        }

        let mut key = Self::from_bytes(&payload[1..1 + PRIVATE_KEY_BYTES_LEN])?;
        key.compressed = compressed;
        key.wif_prefix = payload[0];
        Ok(key)
    }

    /// Encode as WIF using the key's own version byte and compression flag.
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(1 + PRIVATE_KEY_BYTES_LEN + 1 + 4);
        payload.push(self.wif_prefix);
        payload.extend_from_slice(&self.to_bytes());
        if self.compressed {
            payload.push(COMPRESS_MAGIC);
        }
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Return a copy of this key that encodes with a different WIF version byte.
    pub fn with_wif_prefix(mut self, prefix: u8) -> Self {
        self.wif_prefix = prefix;
        self
    }

    /// Return a copy of this key with a different compression flag.
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn wif_prefix(&self) -> u8 {
        self.wif_prefix
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// The matching public key, serialized per this key's compression flag.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key().clone(), self.compressed)
    }

    /// Sign a 32-byte digest with an RFC6979 nonce. The result is low-S.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(digest, self)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes() && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

/// Never print key material.
impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("compressed", &self.compressed)
            .field("wif_prefix", &self.wif_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Private key 0x0c28fca3...1d and its WIF encodings from the Bitcoin wiki.
    const KEY_HEX: &str = "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d";
    const WIF_UNCOMPRESSED: &str = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ";
    const WIF_COMPRESSED: &str = "KwdMAjGmerYanjeui5SHS7JkmpZvVipYvB2LJGU1ZxJwYvP98617";

    #[test]
    fn test_from_wif_uncompressed() {
        let key = PrivateKey::from_wif(WIF_UNCOMPRESSED).unwrap();
        assert_eq!(hex::encode(key.to_bytes()), KEY_HEX);
        assert!(!key.is_compressed());
        assert_eq!(key.wif_prefix(), MAINNET_WIF_PREFIX);
        assert_eq!(key.to_wif(), WIF_UNCOMPRESSED);
    }

    #[test]
    fn test_from_wif_compressed() {
        let key = PrivateKey::from_wif(WIF_COMPRESSED).unwrap();
        assert_eq!(hex::encode(key.to_bytes()), KEY_HEX);
        assert!(key.is_compressed());
        assert_eq!(key.to_wif(), WIF_COMPRESSED);
    }

    #[test]
    fn test_from_wif_bad_checksum() {
        let mut tampered = WIF_COMPRESSED.to_string();
        tampered.pop();
        tampered.push('8');
        let err = PrivateKey::from_wif(&tampered).unwrap_err();
        assert!(matches!(
            err,
            PrimitivesError::ChecksumMismatch | PrimitivesError::InvalidWif(_)
        ));
    }

    #[test]
    fn test_from_wif_garbage() {
        assert!(PrivateKey::from_wif("not-a-wif").is_err());
        assert!(PrivateKey::from_wif("").is_err());
    }

    #[test]
    fn test_testnet_prefix_roundtrip() {
        let key = PrivateKey::from_hex(KEY_HEX)
            .unwrap()
            .with_wif_prefix(TESTNET_WIF_PREFIX);
        let wif = key.to_wif();
        assert!(wif.starts_with('c'));
        let back = PrivateKey::from_wif(&wif).unwrap();
        assert_eq!(back.wif_prefix(), TESTNET_WIF_PREFIX);
        assert_eq!(back, key);
    }

    #[test]
    fn test_from_bytes_rejects_zero_and_short() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
    }
}
