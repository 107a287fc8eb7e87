//! Pay-to-Public-Key-Hash template.
//!
//! Locking script: `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`.
//! Signature script: `<DER signature || sighash byte> <public key>`.

use bch_primitives::ec::{PrivateKey, PublicKey, Signature};
use bch_script::opcodes::*;
use bch_script::{Address, Script};

use crate::output::TransactionOutput;
use crate::sighash::{signature_hash, SighashAlgorithm};
use crate::template::UnlockingScriptTemplate;
use crate::transaction::Transaction;
use crate::TransactionError;

/// The locking script paying to `address`.
pub fn lock(address: &Address) -> Script {
    let mut bytes = Vec::with_capacity(25);
    bytes.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
    bytes.extend_from_slice(address.public_key_hash());
    bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    Script::from(bytes)
}

/// A P2PKH unlocker for `private_key` using `algorithm`.
pub fn unlock(private_key: &PrivateKey, algorithm: SighashAlgorithm) -> P2PKH<'_> {
    P2PKH {
        private_key,
        algorithm,
    }
}

/// Holds the key and digest algorithm for one signing pass.
pub struct P2PKH<'a> {
    private_key: &'a PrivateKey,
    algorithm: SighashAlgorithm,
}

impl UnlockingScriptTemplate for P2PKH<'_> {
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        spent: &TransactionOutput,
    ) -> Result<Script, TransactionError> {
        let digest = signature_hash(tx, input_index, spent, self.algorithm)?;
        let signature = self.private_key.sign(&digest)?;

        let mut sig_buf = signature.to_der();
        sig_buf.push(self.algorithm.flag() as u8);

        let mut script = Script::new();
        script.append_push_data(&sig_buf)?;
        script.append_push_data(&self.private_key.pub_key().to_bytes())?;
        Ok(script)
    }
}

/// Check that input `input_index` carries a valid P2PKH unlock for `spent`.
///
/// The public key must hash to the locking script's key hash, the sighash
/// byte must match `algorithm`, and the signature must verify over the
/// digest of `tx`.
pub fn verify(
    tx: &Transaction,
    input_index: usize,
    spent: &TransactionOutput,
    algorithm: SighashAlgorithm,
) -> Result<(), TransactionError> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!("no input at index {}", input_index))
    })?;
    let pkh = spent.locking_script.public_key_hash()?;

    let items = input.signature_script.push_data_items()?;
    let [sig_with_flag, pub_key_bytes] = items.as_slice() else {
        return Err(TransactionError::SigningError(format!(
            "input {} signature script has {} pushes, want 2",
            input_index,
            items.len()
        )));
    };
    let Some((&flag, der)) = sig_with_flag.split_last() else {
        return Err(TransactionError::SigningError(format!(
            "input {} has an empty signature",
            input_index
        )));
    };
    if flag as u32 != algorithm.flag() {
        return Err(TransactionError::SigningError(format!(
            "input {} sighash type {:#04x}, want {:#04x}",
            input_index,
            flag,
            algorithm.flag()
        )));
    }

    let pub_key = PublicKey::from_bytes(pub_key_bytes)?;
    if pub_key.hash160() != pkh {
        return Err(TransactionError::SigningError(format!(
            "input {} public key does not match the spent output",
            input_index
        )));
    }

    let signature = Signature::from_der(der)?;
    let digest = signature_hash(tx, input_index, spent, algorithm)?;
    if !signature.verify(&digest, &pub_key) {
        return Err(TransactionError::SigningError(format!(
            "input {} signature does not verify",
            input_index
        )));
    }
    Ok(())
}
