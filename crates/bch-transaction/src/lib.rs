/// Bitcoin Cash wallet SDK - Transactions and the send pipeline stages.
///
/// Provides the wire-format transaction model, signature hashing (FORKID and
/// legacy), the P2PKH template, and the three synchronous stages of a send:
/// UTXO selection, transaction building and signing.

pub mod outpoint;
pub mod input;
pub mod output;
pub mod utxo;
pub mod transaction;
pub mod sighash;
pub mod template;
pub mod fee;
pub mod selector;
pub mod builder;
pub mod signer;

mod error;
pub use error::TransactionError;
pub use outpoint::Outpoint;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use utxo::UnspentTransaction;
pub use transaction::Transaction;
pub use sighash::SighashAlgorithm;
pub use fee::SizeModel;
pub use selector::{Selection, StandardUtxoSelector, UtxoSelector};
pub use builder::{StandardTransactionBuilder, TransactionBuilder, UnsignedTransaction};
pub use signer::{
    sign_hashes, CooperativeSignatures, SignedTransaction, StandardTransactionSigner,
    TransactionSigner,
};
