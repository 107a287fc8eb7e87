//! Wallet configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use bch_provider::{BackendKind, MarketConfig, ProviderConfig};
use bch_transaction::{SighashAlgorithm, SizeModel};
use serde::{Deserialize, Serialize};

use crate::WalletError;

/// Fee rate used when none is configured, in satoshis per byte.
pub const DEFAULT_FEE_PER_BYTE: u64 = 60;

/// Smallest change output worth creating, in satoshis.
pub const DEFAULT_DUST_THRESHOLD: u64 = 546;

/// Everything a [`Wallet`](crate::Wallet) needs besides its key.
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration:
///
/// ```toml
/// fee_per_byte = 60
/// cache_dir = "/var/lib/wallet"
///
/// [provider]
/// backend = "blockcypher"
/// network = "testnet"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub provider: ProviderConfig,
    pub market: MarketConfig,
    /// Fee rate for locally built transactions, in satoshis per byte.
    pub fee_per_byte: u64,
    /// Change below this value is left to the fee.
    pub dust_threshold: u64,
    pub size_model: SizeModel,
    /// Root directory of the file cache; `None` keeps the cache in memory.
    pub cache_dir: Option<PathBuf>,
    /// Signature digest algorithm; `None` follows the backend's chain.
    pub sighash: Option<SighashAlgorithm>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            market: MarketConfig::default(),
            fee_per_byte: DEFAULT_FEE_PER_BYTE,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            size_model: SizeModel::default(),
            cache_dir: None,
            sighash: None,
        }
    }
}

impl WalletConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, WalletError> {
        toml::from_str(toml_str).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&toml_str)
    }

    /// The digest algorithm signatures commit to.
    ///
    /// Blockcypher serves Bitcoin, which only knows the legacy digest;
    /// Bitcoin.com serves Bitcoin Cash, which requires FORKID.
    pub fn sighash_algorithm(&self) -> SighashAlgorithm {
        self.sighash.unwrap_or(match self.provider.backend {
            BackendKind::Blockcypher => SighashAlgorithm::Legacy,
            BackendKind::BitcoinCom => SighashAlgorithm::ForkId,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bch_script::Network;

    #[test]
    fn test_empty_document_is_default() {
        let config = WalletConfig::from_toml_str("").unwrap();
        assert_eq!(config.fee_per_byte, 60);
        assert_eq!(config.dust_threshold, 546);
        assert_eq!(config.size_model, SizeModel::default());
        assert_eq!(config.provider.backend, BackendKind::BitcoinCom);
        assert!(config.cache_dir.is_none());
        assert_eq!(config.sighash_algorithm(), SighashAlgorithm::ForkId);
    }

    #[test]
    fn test_full_document() {
        let config = WalletConfig::from_toml_str(
            r#"
            fee_per_byte = 5
            dust_threshold = 1000
            cache_dir = "/tmp/wallets"

            [provider]
            backend = "blockcypher"
            network = "testnet"
            api_token = "abc"

            [size_model]
            base = 10
            per_input = 148
            per_output = 34

            [market]
            fees_url = "http://127.0.0.1:1/fees"
            "#,
        )
        .unwrap();
        assert_eq!(config.fee_per_byte, 5);
        assert_eq!(config.dust_threshold, 1000);
        assert_eq!(config.size_model, SizeModel::P2PKH);
        assert_eq!(config.provider.backend, BackendKind::Blockcypher);
        assert_eq!(config.provider.network, Network::Testnet);
        assert_eq!(config.provider.api_token.as_deref(), Some("abc"));
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.market.fees_url, "http://127.0.0.1:1/fees");
        assert_eq!(config.market.ticker_url, MarketConfig::default().ticker_url);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/wallets")));
        assert_eq!(config.sighash_algorithm(), SighashAlgorithm::Legacy);
    }

    #[test]
    fn test_explicit_sighash_wins() {
        let config = WalletConfig::from_toml_str(
            r#"
            sighash = "forkid"
            [provider]
            backend = "blockcypher"
            "#,
        )
        .unwrap();
        assert_eq!(config.sighash_algorithm(), SighashAlgorithm::ForkId);
    }

    #[test]
    fn test_bad_document() {
        let err = WalletConfig::from_toml_str("fee_per_byte = \"fast\"").unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.toml");
        std::fs::write(&path, "fee_per_byte = 2\n").unwrap();
        assert_eq!(WalletConfig::from_toml_file(&path).unwrap().fee_per_byte, 2);

        let missing = WalletConfig::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(WalletError::Config(_))));
    }
}
