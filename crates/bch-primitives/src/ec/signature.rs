//! ECDSA signatures in strict DER form.
//!
//! Signing uses RFC6979 deterministic nonces and always yields a low-S value,
//! so the same key and digest produce the same bytes every time.

use k256::ecdsa::signature::hazmat::PrehashSigner;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// An ECDSA signature over secp256k1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(k256::ecdsa::Signature);

impl Signature {
    /// Sign a 32-byte digest.
    ///
    /// # Arguments
    /// * `digest` - The already-hashed message (for transactions, the sighash).
    /// * `key` - The signing key.
    ///
    /// # Returns
    /// A low-S signature, or `InvalidSignature` if the backend rejects the digest.
    pub fn sign(digest: &[u8; 32], key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let sig: k256::ecdsa::Signature = key
            .signing_key()
            .sign_prehash(digest)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature(sig.normalize_s().unwrap_or(sig)))
    }

    /// Parse a DER encoded signature (without a trailing sighash byte).
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let sig = k256::ecdsa::Signature::from_der(bytes)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;
        Ok(Signature(sig))
    }

    pub fn to_der(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }

    pub fn to_der_hex(&self) -> String {
        hex::encode(self.to_der())
    }

    /// True when S is in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        self.0.normalize_s().is_none()
    }

    pub fn verify(&self, digest: &[u8; 32], pub_key: &PublicKey) -> bool {
        pub_key.verify(digest, self)
    }

    pub(crate) fn as_k256(&self) -> &k256::ecdsa::Signature {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    fn test_key() -> PrivateKey {
        PrivateKey::from_hex("0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d")
            .unwrap()
    }

    #[test]
    fn test_sign_is_deterministic_and_verifies() {
        let key = test_key();
        let digest = sha256(b"sighash");
        let a = key.sign(&digest).unwrap();
        let b = key.sign(&digest).unwrap();
        assert_eq!(a, b);
        assert!(a.is_low_s());
        assert!(a.verify(&digest, &key.pub_key()));

        let other = sha256(b"other");
        assert!(!a.verify(&other, &key.pub_key()));
    }

    #[test]
    fn test_der_roundtrip() {
        let key = test_key();
        let sig = key.sign(&sha256(b"der")).unwrap();
        let der = sig.to_der();
        assert_eq!(der[0], 0x30);
        assert_eq!(Signature::from_der(&der).unwrap(), sig);
    }

    #[test]
    fn test_from_der_rejects_garbage() {
        assert!(Signature::from_der(&[0x30, 0x01, 0x00]).is_err());
        assert!(Signature::from_der(&[]).is_err());
    }
}
