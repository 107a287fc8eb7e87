/// Bitcoin Cash wallet SDK - Scripts and addresses.
///
/// Provides the `Script` byte wrapper with push-data helpers, the handful of
/// opcodes a P2PKH wallet needs, and legacy Base58Check addresses.

pub mod opcodes;
pub mod chunk;
pub mod script;
pub mod address;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{Address, Network};
pub use chunk::ScriptChunk;
