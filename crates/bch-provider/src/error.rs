//! Error types for ledger backend operations.

/// Errors that can occur while talking to a block-explorer backend or the
/// local cache.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request could not be sent or produced no response body.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Server returned a non-2xx response.
    #[error("server error ({status}): {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the server.
        body: String,
    },

    /// The payload does not match the backend schema.
    #[error("decode mismatch: {0}")]
    DecodeMismatch(String),

    /// The network refused a submitted transaction; carries the backend's
    /// response text verbatim.
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),

    /// A newer reload of the same key superseded this one, or it was
    /// cancelled explicitly.
    #[error("fetch cancelled")]
    Cancelled,

    /// The backend has no endpoint for the requested operation.
    #[error("unsupported by backend {backend}: {operation}")]
    Unsupported {
        /// Backend name.
        backend: String,
        /// Operation that was requested.
        operation: &'static str,
    },

    /// Cache store failure.
    #[error("cache error: {0}")]
    Cache(String),

    #[error("transaction error: {0}")]
    Transaction(#[from] bch_transaction::TransactionError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::NetworkUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::DecodeMismatch(err.to_string())
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Cache(err.to_string())
    }
}
