//! Transaction signing.
//!
//! `StandardTransactionSigner` signs every input of a locally built
//! transaction. `sign_hashes` covers the cooperative mode, where a backend
//! builds the transaction and hands back the digests (`tosign`) for the
//! client to sign.

use bch_primitives::ec::PrivateKey;
use tracing::debug;

use crate::builder::UnsignedTransaction;
use crate::output::TransactionOutput;
use crate::sighash::SighashAlgorithm;
use crate::template::{p2pkh, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// A transaction with every input signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    transaction: Transaction,
    spent_outputs: Vec<TransactionOutput>,
    algorithm: SighashAlgorithm,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn spent_outputs(&self) -> &[TransactionOutput] {
        &self.spent_outputs
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.transaction.to_bytes()
    }

    /// Broadcast-ready hex.
    pub fn to_hex(&self) -> String {
        self.transaction.to_hex()
    }

    pub fn tx_id_hex(&self) -> String {
        self.transaction.tx_id_hex()
    }

    pub fn fee(&self) -> u64 {
        let inputs = self
            .spent_outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value));
        inputs.saturating_sub(self.transaction.total_output_value())
    }

    /// Re-check every input's signature script against the output it spends.
    pub fn verify(&self) -> Result<(), TransactionError> {
        for (index, spent) in self.spent_outputs.iter().enumerate() {
            p2pkh::verify(&self.transaction, index, spent, self.algorithm)?;
        }
        Ok(())
    }
}

/// Signs unsigned transactions.
pub trait TransactionSigner {
    /// Sign every input using the key that controls its spent output.
    ///
    /// # Returns
    /// The signed transaction, or `SigningError` if a key is missing or a
    /// spent output uses a script type the signer does not know.
    fn sign(
        &self,
        unsigned: UnsignedTransaction,
        keys: &[PrivateKey],
    ) -> Result<SignedTransaction, TransactionError>;
}

/// Signer for P2PKH outputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardTransactionSigner {
    pub algorithm: SighashAlgorithm,
}

impl StandardTransactionSigner {
    pub fn new(algorithm: SighashAlgorithm) -> Self {
        StandardTransactionSigner { algorithm }
    }
}

impl TransactionSigner for StandardTransactionSigner {
    fn sign(
        &self,
        unsigned: UnsignedTransaction,
        keys: &[PrivateKey],
    ) -> Result<SignedTransaction, TransactionError> {
        let (mut transaction, spent_outputs) = unsigned.into_parts();

        let mut scripts = Vec::with_capacity(spent_outputs.len());
        for (index, spent) in spent_outputs.iter().enumerate() {
            if !spent.locking_script.is_p2pkh() {
                return Err(TransactionError::SigningError(format!(
                    "input {} spends an unsupported script type: {}",
                    index, spent.locking_script
                )));
            }
            let pkh = spent.locking_script.public_key_hash()?;
            let key = keys
                .iter()
                .find(|k| k.pub_key().hash160() == pkh)
                .ok_or_else(|| {
                    TransactionError::SigningError(format!(
                        "no key for input {} (pubkey hash {})",
                        index,
                        hex::encode(pkh)
                    ))
                })?;
            scripts.push(p2pkh::unlock(key, self.algorithm).sign(&transaction, index, spent)?);
        }

        for (input, script) in transaction.inputs.iter_mut().zip(scripts) {
            input.signature_script = script;
        }
        debug!(
            txid = %transaction.tx_id_hex(),
            inputs = transaction.inputs.len(),
            "signed transaction"
        );

        Ok(SignedTransaction {
            transaction,
            spent_outputs,
            algorithm: self.algorithm,
        })
    }
}

/// Parallel signature and public key lists for a two-phase submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CooperativeSignatures {
    /// DER signatures in hex, without a sighash byte.
    pub signatures: Vec<String>,
    /// The signer's public key in hex, once per signature.
    pub public_keys: Vec<String>,
}

/// Sign backend-computed digests independently.
///
/// # Arguments
/// * `hashes` - Hex digests exactly as the backend returned them.
/// * `key` - The signing key.
///
/// # Returns
/// One signature and one public key per hash, in order, or `SigningError`
/// if a hash is not 32 bytes of hex.
pub fn sign_hashes<S: AsRef<str>>(
    hashes: &[S],
    key: &PrivateKey,
) -> Result<CooperativeSignatures, TransactionError> {
    let pub_key_hex = key.pub_key().to_hex();
    let mut out = CooperativeSignatures::default();
    for (i, hash) in hashes.iter().enumerate() {
        let bytes = hex::decode(hash.as_ref()).map_err(|e| {
            TransactionError::SigningError(format!("tosign[{}] is not hex: {}", i, e))
        })?;
        let digest: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            TransactionError::SigningError(format!(
                "tosign[{}] is {} bytes, want 32",
                i,
                bytes.len()
            ))
        })?;
        out.signatures.push(key.sign(&digest)?.to_der_hex());
        out.public_keys.push(pub_key_hex.clone());
    }
    Ok(out)
}
