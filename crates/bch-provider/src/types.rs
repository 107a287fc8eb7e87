//! Provider data types: configuration and the canonical ledger models every
//! backend is normalized into.

use bch_script::Network;
use serde::{Deserialize, Serialize};

/// Built-in block-explorer backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Blockcypher REST API (integer satoshi amounts).
    Blockcypher,
    /// Bitcoin.com REST API (decimal coin amounts).
    #[default]
    BitcoinCom,
}

/// Configuration for a [`ProviderAdapter`](crate::ProviderAdapter) and
/// [`RestBroadcaster`](crate::RestBroadcaster).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which backend schema to use.
    pub backend: BackendKind,
    /// Network the wallet lives on; selects the backend's base URL.
    pub network: Network,
    /// Overrides the schema's base URL (e.g. a mock server in tests).
    pub base_url: Option<String>,
    /// Optional API token, sent as the `token` query parameter.
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            network: Network::Mainnet,
            base_url: None,
            api_token: None,
            timeout_secs: 30,
        }
    }
}

/// Whether a historical transaction moved value into or out of the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// One entry of an address's transaction history, relative to that address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend-provided time, verbatim (RFC 3339 string or unix seconds).
    pub timestamp: String,
    pub direction: Direction,
    /// Transaction id in display order.
    pub hash: String,
    /// First address of the last input that lists one.
    pub from: String,
    /// First address of the last output that lists one.
    pub to: String,
    /// Value in satoshis, computed per [`Direction`].
    pub value: u64,
    pub confirmations: u64,
}

/// Recommended fee rates in satoshis per byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fees {
    #[serde(rename = "fastestFee")]
    pub fastest: u64,
    #[serde(rename = "halfHourFee")]
    pub half_hour: u64,
    #[serde(rename = "hourFee")]
    pub hour: u64,
}

/// A server-built transaction awaiting cooperative signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Hex-encoded signature hashes, one per input.
    pub tosign: Vec<String>,
    /// Fee in satoshis as quoted by the backend.
    pub fee: u64,
    /// The full draft as returned by the backend; echoed back on submit.
    pub body: serde_json::Value,
}
