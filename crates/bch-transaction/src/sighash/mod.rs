//! Signature hash computation.
//!
//! Two digests are supported, both for `SIGHASH_ALL`:
//!
//! - `ForkId`: the replay-protected BIP143-style digest used on Bitcoin Cash
//!   since the UAHF fork. It commits to the spent value.
//! - `Legacy`: the original digest, which serializes a copy of the
//!   transaction with every signature script cleared and the spent locking
//!   script placed in the input being signed.
//!
//! See <https://github.com/bitcoincashorg/bitcoincash.org/blob/master/spec/replay-protected-sighash.md>

use bch_primitives::hash::sha256d;
use bch_primitives::util::{BchWriter, VarInt};
use bch_script::Script;
use serde::{Deserialize, Serialize};

use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_FORKID: u32 = 0x40;
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Which digest algorithm a signer uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SighashAlgorithm {
    #[default]
    ForkId,
    Legacy,
}

impl SighashAlgorithm {
    /// The sighash type committed to in the digest and appended to signatures.
    pub fn flag(&self) -> u32 {
        match self {
            SighashAlgorithm::ForkId => SIGHASH_ALL_FORKID,
            SighashAlgorithm::Legacy => SIGHASH_ALL,
        }
    }
}

/// Compute the digest a signature for `input_index` commits to.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `spent` - The output the input spends (locking script and value).
/// * `algorithm` - Which digest to compute.
///
/// # Returns
/// The 32-byte double-SHA256 digest.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    spent: &TransactionOutput,
    algorithm: SighashAlgorithm,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    let preimage = match algorithm {
        SighashAlgorithm::ForkId => forkid_preimage(tx, input_index, spent),
        SighashAlgorithm::Legacy => legacy_preimage(tx, input_index, &spent.locking_script),
    };
    Ok(sha256d(&preimage))
}

/// BIP143-style preimage for `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// version, hashPrevouts, hashSequence, outpoint, scriptCode, value,
/// nSequence, hashOutputs, nLockTime, sighash type.
pub(crate) fn forkid_preimage(tx: &Transaction, input_index: usize, spent: &TransactionOutput) -> Vec<u8> {
    let input = &tx.inputs[input_index];

    let mut prevouts = BchWriter::with_capacity(tx.inputs.len() * 36);
    let mut sequences = BchWriter::with_capacity(tx.inputs.len() * 4);
    for i in &tx.inputs {
        prevouts.write_bytes(i.previous_output.hash.as_bytes());
        prevouts.write_u32_le(i.previous_output.index);
        sequences.write_u32_le(i.sequence);
    }
    let mut outputs = BchWriter::new();
    for o in &tx.outputs {
        outputs.write_bytes(&o.to_bytes());
    }

    let script = spent.locking_script.to_bytes();
    let mut writer = BchWriter::with_capacity(156 + script.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&sha256d(&prevouts.into_bytes()));
    writer.write_bytes(&sha256d(&sequences.into_bytes()));
    writer.write_bytes(input.previous_output.hash.as_bytes());
    writer.write_u32_le(input.previous_output.index);
    writer.write_varint(VarInt::from(script.len()));
    writer.write_bytes(script);
    writer.write_u64_le(spent.value);
    writer.write_u32_le(input.sequence);
    writer.write_bytes(&sha256d(&outputs.into_bytes()));
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(SIGHASH_ALL_FORKID);
    writer.into_bytes()
}

/// Original `SIGHASH_ALL` preimage: the modified transaction followed by the
/// 4-byte sighash type.
pub(crate) fn legacy_preimage(tx: &Transaction, input_index: usize, spent_script: &Script) -> Vec<u8> {
    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.signature_script = if i == input_index {
            spent_script.clone()
        } else {
            Script::new()
        };
    }
    let mut bytes = copy.to_bytes();
    bytes.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
    bytes
}
