use crate::pipeline::PipelineState;

/// Error types for wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("provider error: {0}")]
    Provider(#[from] bch_provider::ProviderError),

    #[error("transaction error: {0}")]
    Transaction(#[from] bch_transaction::TransactionError),

    #[error("primitives error: {0}")]
    Primitives(#[from] bch_primitives::PrimitivesError),

    #[error("script error: {0}")]
    Script(#[from] bch_script::ScriptError),

    /// Configuration could not be read or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// No private key is stored in the wallet's cache.
    #[error("no private key stored")]
    KeyNotFound,

    /// The send pipeline was asked to make a transition it does not allow.
    #[error("invalid pipeline transition: {from} -> {to}")]
    InvalidState {
        from: PipelineState,
        to: PipelineState,
    },
}

impl WalletError {
    /// Whether the network refused a submitted transaction.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WalletError::Provider(bch_provider::ProviderError::BroadcastRejected(_))
        )
    }
}
