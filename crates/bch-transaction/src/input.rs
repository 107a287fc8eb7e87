//! Transaction input.

use bch_primitives::util::{BchReader, BchWriter};
use bch_script::Script;

use crate::outpoint::Outpoint;
use crate::TransactionError;

/// Final sequence number (no relative lock time).
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// An input spending `previous_output`.
///
/// `signature_script` is empty until the input is signed.
///
/// # Wire format
///
/// | Field            | Size          |
/// |------------------|---------------|
/// | previous hash    | 32 bytes      |
/// | previous index   | 4 bytes (LE)  |
/// | script length    | VarInt        |
/// | signature_script | variable      |
/// | sequence         | 4 bytes (LE)  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_output: Outpoint,
    pub signature_script: Script,
    pub sequence: u32,
}

impl TransactionInput {
    /// An unsigned input with the default sequence.
    pub fn new(previous_output: Outpoint) -> Self {
        TransactionInput {
            previous_output,
            signature_script: Script::new(),
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signature_script.is_empty()
    }

    pub(crate) fn read_from(reader: &mut BchReader) -> Result<Self, TransactionError> {
        let previous_output = Outpoint::read_from(reader)?;
        let signature_script = Script::from_bytes(reader.read_var_bytes()?);
        let sequence = reader.read_u32_le()?;
        Ok(TransactionInput {
            previous_output,
            signature_script,
            sequence,
        })
    }

    pub(crate) fn write_to(&self, writer: &mut BchWriter) {
        self.previous_output.write_to(writer);
        writer.write_var_bytes(self.signature_script.to_bytes());
        writer.write_u32_le(self.sequence);
    }
}
