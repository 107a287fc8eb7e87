//! Spendable outputs as reported by a ledger backend.

use serde::{Deserialize, Serialize};

use crate::outpoint::Outpoint;
use crate::output::TransactionOutput;

/// An unspent output and where it lives.
///
/// Sets of these are replaced wholesale on every fetch; nothing tracks
/// spentness locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentTransaction {
    pub output: TransactionOutput,
    pub outpoint: Outpoint,
}

impl UnspentTransaction {
    pub fn new(output: TransactionOutput, outpoint: Outpoint) -> Self {
        UnspentTransaction { output, outpoint }
    }

    pub fn value(&self) -> u64 {
        self.output.value
    }
}
