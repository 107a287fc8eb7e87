//! # bch-provider
//!
//! Block-explorer access for the wallet SDK. Every backend is described by a
//! declarative [`BackendSchema`] and served by one [`ProviderAdapter`], which
//! normalizes payloads into canonical UTXO and history lists and caches the
//! canonical form in a typed [`Cache`].
//!
//! # Example
//!
//! ```no_run
//! use bch_provider::{BackendKind, Cache, ProviderAdapter, ProviderConfig};
//! use bch_script::Address;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig {
//!     backend: BackendKind::Blockcypher,
//!     ..Default::default()
//! };
//! let adapter = ProviderAdapter::new(&config, Cache::in_memory());
//! let address = Address::from_string("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH")?;
//!
//! let utxos = adapter.fetch_utxos(&address).await?;
//! println!("{} spendable outputs", utxos.len());
//! assert_eq!(adapter.cached_utxos(), Some(utxos));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod broadcaster;
pub mod cache;
mod client;
pub mod error;
pub mod market;
pub mod normalize;
pub mod schema;
pub mod types;


pub use adapter::ProviderAdapter;
pub use broadcaster::{Broadcaster, DraftBroadcaster, RestBroadcaster};
pub use cache::{Cache, CacheKey, CacheStore, FileCacheStore, MemoryCacheStore, CACHE_SCHEMA_VERSION};
pub use error::ProviderError;
pub use market::{FeeProvider, MarketConfig, RateProvider};
pub use schema::{AmountUnit, BackendSchema, HashOrder};
pub use types::{BackendKind, Direction, Draft, Fees, HistoryEntry, ProviderConfig};
