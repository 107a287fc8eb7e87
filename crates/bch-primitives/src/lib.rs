/// Bitcoin Cash wallet SDK - Cryptographic primitives, hashing, and wire encoding.
///
/// This crate provides the foundational building blocks for the wallet SDK:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, Hash160)
/// - Chain hash type with byte-reversed display for transaction ids
/// - Variable-length integer encoding and a little-endian reader/writer
/// - secp256k1 private keys (WIF), public keys and DER signatures

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod ec;

mod error;
pub use error::PrimitivesError;
