/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction or a request to build one is structurally invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A signing key is missing or the spent output's script type is unknown.
    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The candidate UTXOs cannot cover the target plus fee.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("script error: {0}")]
    Script(#[from] bch_script::ScriptError),

    #[error("primitives error: {0}")]
    Primitives(#[from] bch_primitives::PrimitivesError),
}
