//! Script chunk decoding and push-data encoding.

use crate::opcodes::*;
use crate::ScriptError;

/// One element of a script: an opcode, or a push with its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes this is the payload length.
    pub op: u8,
    pub data: Option<Vec<u8>>,
}

/// Decode raw script bytes into chunks.
///
/// # Arguments
/// * `bytes` - The raw script.
///
/// # Returns
/// The chunks in order, or `DataTooSmall` if a push runs past the end.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];
        pos += 1;

        let (len, header) = match op {
            1..=OP_DATA_75 => (op as usize, 0),
            OP_PUSHDATA1 => (read_len(bytes, pos, 1)?, 1),
            OP_PUSHDATA2 => (read_len(bytes, pos, 2)?, 2),
            OP_PUSHDATA4 => (read_len(bytes, pos, 4)?, 4),
            _ => {
                chunks.push(ScriptChunk { op, data: None });
                continue;
            }
        };
        pos += header;
        let end = pos.checked_add(len).ok_or(ScriptError::DataTooSmall)?;
        if end > bytes.len() {
            return Err(ScriptError::DataTooSmall);
        }
        chunks.push(ScriptChunk {
            op,
            data: Some(bytes[pos..end].to_vec()),
        });
        pos = end;
    }

    Ok(chunks)
}

fn read_len(bytes: &[u8], pos: usize, width: usize) -> Result<usize, ScriptError> {
    let raw = bytes.get(pos..pos + width).ok_or(ScriptError::DataTooSmall)?;
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(raw);
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Minimal push prefix for a payload of `data_len` bytes.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    let prefix = match data_len {
        0..=0x4b => vec![data_len as u8],
        0x4c..=0xff => vec![OP_PUSHDATA1, data_len as u8],
        0x100..=0xffff => {
            let mut buf = vec![OP_PUSHDATA2];
            buf.extend_from_slice(&(data_len as u16).to_le_bytes());
            buf
        }
        _ => {
            let len = u32::try_from(data_len).map_err(|_| ScriptError::DataTooBig)?;
            let mut buf = vec![OP_PUSHDATA4];
            buf.extend_from_slice(&len.to_le_bytes());
            buf
        }
    };
    Ok(prefix)
}
