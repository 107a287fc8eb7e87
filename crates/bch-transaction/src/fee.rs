//! Serialized-size model used for fee estimation.

use serde::{Deserialize, Serialize};

/// Linear size estimate: `base + per_input * inputs + per_output * outputs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeModel {
    pub base: u64,
    pub per_input: u64,
    pub per_output: u64,
}

impl SizeModel {
    /// Full-size P2PKH inputs with an uncompressed key (148 bytes each).
    pub const P2PKH: SizeModel = SizeModel {
        base: 10,
        per_input: 148,
        per_output: 34,
    };

    /// Estimated serialized size in bytes.
    pub fn estimate(&self, inputs: usize, outputs: usize) -> u64 {
        self.base
            .saturating_add(self.per_input.saturating_mul(inputs as u64))
            .saturating_add(self.per_output.saturating_mul(outputs as u64))
    }

    /// `fee_per_byte * estimate(inputs, outputs)`, saturating.
    pub fn fee(&self, fee_per_byte: u64, inputs: usize, outputs: usize) -> u64 {
        fee_per_byte.saturating_mul(self.estimate(inputs, outputs))
    }
}

/// 2 inputs and 2 outputs come to 226 bytes.
impl Default for SizeModel {
    fn default() -> Self {
        SizeModel {
            base: 10,
            per_input: 74,
            per_output: 34,
        }
    }
}
