/// Error types for script and address handling.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// Script ended in the middle of a push.
    #[error("not enough data")]
    DataTooSmall,

    #[error("data too big")]
    DataTooBig,

    #[error("not a P2PKH")]
    NotP2PKH,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid address length for '{0}'")]
    InvalidAddressLength(String),

    /// Version byte is neither mainnet nor testnet P2PKH.
    #[error("address version {version:#04x} not supported for '{address}'")]
    UnsupportedAddress { address: String, version: u8 },

    #[error("checksum failed")]
    EncodingChecksumFailed,

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("primitives error: {0}")]
    Primitives(#[from] bch_primitives::PrimitivesError),
}
