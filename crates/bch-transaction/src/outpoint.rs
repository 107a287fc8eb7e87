//! Reference to an output of a prior transaction.

use std::fmt;

use bch_primitives::chainhash::Hash;
use bch_primitives::util::{BchReader, BchWriter};
use serde::{Deserialize, Serialize};

use crate::TransactionError;

/// `hash` is in internal byte order: the reverse of the txid hex that
/// explorers display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub hash: Hash,
    pub index: u32,
}

impl Outpoint {
    pub fn new(hash: Hash, index: u32) -> Self {
        Outpoint { hash, index }
    }

    /// Build an outpoint from a display-order txid.
    ///
    /// # Arguments
    /// * `txid` - 64 hex characters as returned by a block explorer.
    /// * `index` - Output index within that transaction.
    pub fn from_txid_hex(txid: &str, index: u32) -> Result<Self, TransactionError> {
        Ok(Outpoint {
            hash: Hash::from_hex(txid)?,
            index,
        })
    }

    /// The txid in display order. `from_txid_hex(o.txid_hex(), i)` gives `o` back.
    pub fn txid_hex(&self) -> String {
        self.hash.to_string()
    }

    pub(crate) fn read_from(reader: &mut BchReader) -> Result<Self, TransactionError> {
        let hash = Hash::from_bytes(reader.read_bytes(32)?)?;
        let index = reader.read_u32_le()?;
        Ok(Outpoint { hash, index })
    }

    pub(crate) fn write_to(&self, writer: &mut BchWriter) {
        writer.write_bytes(self.hash.as_bytes());
        writer.write_u32_le(self.index);
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}
