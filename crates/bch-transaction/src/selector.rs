//! UTXO selection.
//!
//! Largest-first greedy selection. Candidates are ordered by descending
//! value with a stable sort, so equal values keep their input order and the
//! same input always yields the same selection.

use tracing::debug;

use crate::fee::SizeModel;
use crate::utxo::UnspentTransaction;
use crate::TransactionError;

/// Outputs assumed when sizing the fee: payment and change.
pub const SELECTION_OUTPUT_COUNT: usize = 2;

/// The chosen UTXOs and the fee computed for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub utxos: Vec<UnspentTransaction>,
    pub fee: u64,
}

impl Selection {
    pub fn total(&self) -> u64 {
        self.utxos
            .iter()
            .fold(0u64, |acc, u| acc.saturating_add(u.value()))
    }
}

/// Picks the UTXOs that fund a payment.
pub trait UtxoSelector {
    /// Select from `utxos` enough value to cover `target` plus the fee.
    ///
    /// # Returns
    /// The selection, or `InsufficientFunds` when even every candidate falls short.
    fn select(
        &self,
        utxos: &[UnspentTransaction],
        target: u64,
    ) -> Result<Selection, TransactionError>;
}

/// Greedy largest-first selector with a per-byte fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StandardUtxoSelector {
    pub fee_per_byte: u64,
    pub size_model: SizeModel,
}

impl StandardUtxoSelector {
    pub fn new(fee_per_byte: u64, size_model: SizeModel) -> Self {
        StandardUtxoSelector {
            fee_per_byte,
            size_model,
        }
    }

    fn fee_for(&self, inputs: usize) -> u64 {
        self.size_model
            .fee(self.fee_per_byte, inputs, SELECTION_OUTPUT_COUNT)
    }
}

impl UtxoSelector for StandardUtxoSelector {
    fn select(
        &self,
        utxos: &[UnspentTransaction],
        target: u64,
    ) -> Result<Selection, TransactionError> {
        if target == 0 {
            return Err(TransactionError::InvalidTransaction(
                "target value must be positive".to_string(),
            ));
        }

        // The whole set must cover the fee at the maximal input count.
        let available = utxos
            .iter()
            .fold(0u64, |acc, u| acc.saturating_add(u.value()));
        let required = target.saturating_add(self.fee_for(utxos.len()));
        if available < required {
            debug!(available, required, "utxo selection short of funds");
            return Err(TransactionError::InsufficientFunds {
                required,
                available,
            });
        }

        let mut ordered: Vec<&UnspentTransaction> = utxos.iter().collect();
        ordered.sort_by(|a, b| b.value().cmp(&a.value()));

        let mut selected = Vec::new();
        let mut total = 0u64;
        for utxo in ordered {
            selected.push(utxo.clone());
            total = total.saturating_add(utxo.value());
            let fee = self.fee_for(selected.len());
            if total >= target.saturating_add(fee) {
                debug!(
                    inputs = selected.len(),
                    total, target, fee, "utxo selection complete"
                );
                return Ok(Selection {
                    utxos: selected,
                    fee,
                });
            }
        }

        // Unreachable while the fee grows with the input count.
        debug!(available = total, required, "utxo selection short of funds");
        Err(TransactionError::InsufficientFunds {
            required,
            available: total,
        })
    }
}
