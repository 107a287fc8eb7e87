//! Wallet cache: a raw key/bytes store and the typed layer above it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Version of the canonical models stored by [`Cache`]. Entries written
/// under any other version read as misses.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Logical cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Balance,
    Utxos,
    Transactions,
    Fees,
    RateUsd,
    RateBch,
    Wif,
}

impl CacheKey {
    /// The backend-independent logical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Balance => "balance",
            CacheKey::Utxos => "utxos",
            CacheKey::Transactions => "transactions",
            CacheKey::Fees => "fees",
            CacheKey::RateUsd => "rateUSD",
            CacheKey::RateBch => "rateBCH",
            CacheKey::Wif => "wif",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key to bytes persistence.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ProviderError>;

    fn remove(&self, key: &str) -> Result<(), ProviderError>;
}

/// In-process store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, ProviderError> {
        self.entries
            .lock()
            .map_err(|_| ProviderError::Cache("memory store lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ProviderError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ProviderError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One file per key inside a per-wallet directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Open (creating if needed) the store for one wallet.
    ///
    /// # Arguments
    /// * `root` - directory holding every wallet's cache
    /// * `wallet_id` - stable wallet identifier, e.g. the public key hex
    pub fn open(root: impl AsRef<Path>, wallet_id: &str) -> Result<Self, ProviderError> {
        if wallet_id.is_empty() || !wallet_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProviderError::Cache(format!("invalid wallet id {wallet_id:?}")));
        }
        let dir = root.as_ref().join(wallet_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ProviderError> {
        // Write-then-rename so readers never see a torn entry.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ProviderError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    backend: String,
    value: T,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
    backend: String,
}

/// Typed cache keyed by `(CacheKey, CACHE_SCHEMA_VERSION)`.
///
/// Values are canonical models, never raw backend payloads, so an entry
/// written through one backend stays readable after switching to another.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// A cache backed by a fresh [`MemoryCacheStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()))
    }

    /// Read a value. Missing, unreadable or other-version entries are misses.
    pub fn load<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let bytes = match self.store.get(key.as_str()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed");
                return None;
            }
        };
        let header: Header = match serde_json::from_slice(&bytes) {
            Ok(header) => header,
            Err(e) => {
                warn!(key = %key, error = %e, "discarding unreadable cache entry");
                return None;
            }
        };
        if header.version != CACHE_SCHEMA_VERSION {
            debug!(key = %key, version = header.version, "cache entry from another schema version");
            return None;
        }
        match serde_json::from_slice::<Envelope<T>>(&bytes) {
            Ok(envelope) => Some(envelope.value),
            Err(e) => {
                warn!(key = %key, backend = %header.backend, error = %e, "cache entry does not decode");
                None
            }
        }
    }

    /// Write a value, recording which backend produced it.
    pub fn store<T: Serialize>(&self, key: CacheKey, backend: &str, value: &T) -> Result<(), ProviderError> {
        let envelope = Envelope {
            version: CACHE_SCHEMA_VERSION,
            backend: backend.to_string(),
            value,
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| ProviderError::Cache(format!("encode {key}: {e}")))?;
        self.store.set(key.as_str(), &bytes)?;
        debug!(key = %key, backend, bytes = bytes.len(), "cache entry written");
        Ok(())
    }

    /// Read a scalar stored as a decimal string.
    pub fn load_scalar<T: std::str::FromStr>(&self, key: CacheKey) -> Option<T> {
        self.load::<String>(key)?.parse().ok()
    }

    /// Store a scalar as a decimal string.
    pub fn store_scalar<T: ToString>(&self, key: CacheKey, backend: &str, value: &T) -> Result<(), ProviderError> {
        self.store(key, backend, &value.to_string())
    }

    /// Name of the backend that wrote the current entry, if any.
    pub fn backend_of(&self, key: CacheKey) -> Option<String> {
        let bytes = self.store.get(key.as_str()).ok()??;
        let header: Header = serde_json::from_slice(&bytes).ok()?;
        Some(header.backend)
    }

    pub fn remove(&self, key: CacheKey) -> Result<(), ProviderError> {
        self.store.remove(key.as_str())
    }
}
