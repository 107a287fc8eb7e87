//! Transaction output.

use bch_primitives::util::{BchReader, BchWriter};
use bch_script::Script;
use serde::{Deserialize, Serialize};

use crate::TransactionError;

/// `value` is in satoshis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: u64,
    pub locking_script: Script,
}

impl TransactionOutput {
    pub fn new(value: u64, locking_script: Script) -> Self {
        TransactionOutput {
            value,
            locking_script,
        }
    }

    pub(crate) fn read_from(reader: &mut BchReader) -> Result<Self, TransactionError> {
        let value = reader.read_u64_le()?;
        let locking_script = Script::from_bytes(reader.read_var_bytes()?);
        Ok(TransactionOutput {
            value,
            locking_script,
        })
    }

    pub(crate) fn write_to(&self, writer: &mut BchWriter) {
        writer.write_u64_le(self.value);
        writer.write_var_bytes(self.locking_script.to_bytes());
    }

    /// Serialized form, as committed to by the FORKID sighash.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BchWriter::with_capacity(8 + 1 + self.locking_script.len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}
