#![deny(missing_docs)]

//! Bitcoin Cash wallet SDK - Complete SDK.
//!
//! Re-exports all wallet SDK components for convenient single-crate usage.

pub use bch_primitives as primitives;
pub use bch_script as script;
pub use bch_transaction as transaction;
pub use bch_provider as provider;
pub use bch_wallet as wallet;

pub use bch_wallet::{SendReport, Wallet, WalletConfig, WalletError};
