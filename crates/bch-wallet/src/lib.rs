//! # bch-wallet
//!
//! A single-address Bitcoin Cash wallet. [`Wallet`] composes the provider
//! layer (balance, UTXO and history fetches, typed cache, broadcasting) with
//! the selection, building and signing stages of `bch-transaction`, and
//! tracks each payment through a [`SendPipeline`].
//!
//! # Example
//!
//! ```no_run
//! use bch_script::Address;
//! use bch_wallet::{Wallet, WalletConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WalletConfig::from_toml_file("wallet.toml")?;
//! let wallet = Wallet::from_wif("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn", config)?;
//!
//! wallet.reload_utxos().await?;
//! let to = Address::from_string("1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm")?;
//! let report = wallet.send(&to, 120_000).await?;
//! println!("sent {} (fee {}, change {})", report.txid, report.fee, report.change);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod pipeline;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use config::WalletConfig;
pub use error::WalletError;
pub use pipeline::{PipelineState, SendPipeline};
pub use wallet::{settle_change, SendReport, Wallet};
