//! Script templates.
//!
//! A template knows how to produce the signature script for one input once
//! it is given the output that input spends.

pub mod p2pkh;

use bch_script::Script;

use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Produces signature scripts for inputs.
pub trait UnlockingScriptTemplate {
    /// Sign input `input_index` of `tx`, which spends `spent`.
    ///
    /// # Returns
    /// The signature script to place in the input.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        spent: &TransactionOutput,
    ) -> Result<Script, TransactionError>;
}
