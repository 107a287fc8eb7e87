//! Transaction assembly.

use bch_script::Address;
use tracing::debug;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::template::p2pkh;
use crate::transaction::{Transaction, DEFAULT_VERSION};
use crate::utxo::UnspentTransaction;
use crate::TransactionError;

/// A transaction whose inputs are not yet signed, together with the
/// outputs those inputs spend (signing needs their scripts and values).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    transaction: Transaction,
    spent_outputs: Vec<TransactionOutput>,
}

impl UnsignedTransaction {
    /// Pair a transaction with the outputs its inputs spend, in input order.
    pub fn new(
        transaction: Transaction,
        spent_outputs: Vec<TransactionOutput>,
    ) -> Result<Self, TransactionError> {
        if transaction.inputs.len() != spent_outputs.len() {
            return Err(TransactionError::InvalidTransaction(format!(
                "{} inputs but {} spent outputs",
                transaction.inputs.len(),
                spent_outputs.len()
            )));
        }
        Ok(UnsignedTransaction {
            transaction,
            spent_outputs,
        })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn spent_outputs(&self) -> &[TransactionOutput] {
        &self.spent_outputs
    }

    pub fn input_total(&self) -> u64 {
        self.spent_outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value))
    }

    /// Inputs minus outputs, or `None` if the outputs exceed the inputs.
    pub fn fee(&self) -> Option<u64> {
        self.input_total()
            .checked_sub(self.transaction.total_output_value())
    }

    pub(crate) fn into_parts(self) -> (Transaction, Vec<TransactionOutput>) {
        (self.transaction, self.spent_outputs)
    }
}

/// Turns selected UTXOs and destinations into an unsigned transaction.
pub trait TransactionBuilder {
    /// One input per UTXO and one output per destination, both in the order given.
    fn build(
        &self,
        destinations: &[(Address, u64)],
        utxos: &[UnspentTransaction],
    ) -> Result<UnsignedTransaction, TransactionError>;
}

/// P2PKH builder with fixed version and lock time.
///
/// Change is the caller's concern: it arrives as just another destination.
/// No dust filtering happens here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StandardTransactionBuilder {
    pub version: u32,
    pub lock_time: u32,
}

impl Default for StandardTransactionBuilder {
    fn default() -> Self {
        StandardTransactionBuilder {
            version: DEFAULT_VERSION,
            lock_time: 0,
        }
    }
}

impl TransactionBuilder for StandardTransactionBuilder {
    fn build(
        &self,
        destinations: &[(Address, u64)],
        utxos: &[UnspentTransaction],
    ) -> Result<UnsignedTransaction, TransactionError> {
        if utxos.is_empty() {
            return Err(TransactionError::InvalidTransaction(
                "no inputs to spend".to_string(),
            ));
        }
        if destinations.is_empty() {
            return Err(TransactionError::InvalidTransaction(
                "no destinations".to_string(),
            ));
        }

        let transaction = Transaction {
            version: self.version,
            inputs: utxos
                .iter()
                .map(|u| TransactionInput::new(u.outpoint))
                .collect(),
            outputs: destinations
                .iter()
                .map(|(address, value)| TransactionOutput::new(*value, p2pkh::lock(address)))
                .collect(),
            lock_time: self.lock_time,
        };
        let spent_outputs = utxos.iter().map(|u| u.output.clone()).collect();

        debug!(
            inputs = transaction.inputs.len(),
            outputs = transaction.outputs.len(),
            "built unsigned transaction"
        );
        UnsignedTransaction::new(transaction, spent_outputs)
    }
}
