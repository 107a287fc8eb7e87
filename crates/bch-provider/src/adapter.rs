//! Schema-driven ledger adapter.
//!
//! One `ProviderAdapter` serves every backend: it fetches a payload, decodes
//! it through the backend's [`BackendSchema`], and only then persists the
//! canonical result. Fetches are single-flight per cache key: starting a new
//! fetch cancels any older fetch of the same key, and only the newest
//! generation may write the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bch_script::Address;
use bch_transaction::UnspentTransaction;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheKey};
use crate::client::RestClient;
use crate::error::ProviderError;
use crate::normalize;
use crate::schema::BackendSchema;
use crate::types::{HistoryEntry, ProviderConfig};

struct Inflight {
    generation: u64,
    token: CancellationToken,
}

/// Fetches, normalizes and caches ledger data for one backend.
#[derive(Clone)]
pub struct ProviderAdapter {
    schema: BackendSchema,
    client: RestClient,
    cache: Cache,
    inflight: Arc<Mutex<HashMap<CacheKey, Inflight>>>,
    next_generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("backend", &self.schema.name)
            .field("base_url", &self.schema.base_url)
            .finish_non_exhaustive()
    }
}

impl ProviderAdapter {
    /// Create an adapter for the configured built-in backend.
    pub fn new(config: &ProviderConfig, cache: Cache) -> Self {
        let schema = BackendSchema::for_backend(config.backend, config.network);
        Self::with_schema(schema, config, cache)
    }

    /// Create an adapter driven by an arbitrary schema.
    ///
    /// `config.base_url`, when set, overrides the schema's base URL.
    pub fn with_schema(schema: BackendSchema, config: &ProviderConfig, cache: Cache) -> Self {
        let schema = match &config.base_url {
            Some(url) => schema.with_base_url(url.clone()),
            None => schema,
        };
        Self {
            schema,
            client: RestClient::new(config),
            cache,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn schema(&self) -> &BackendSchema {
        &self.schema
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Fetch the balance of `address` in satoshis and cache it.
    pub async fn fetch_balance(&self, address: &Address) -> Result<u64, ProviderError> {
        let url = self.schema.url(&self.schema.balance.path, address.as_str());
        let mapping = &self.schema.balance;
        self.single_flight(
            CacheKey::Balance,
            &url,
            |payload| normalize::decode_balance(payload, mapping),
            |cache, backend, sats| cache.store_scalar(CacheKey::Balance, backend, sats),
        )
        .await
    }

    /// Fetch the unspent outputs of `address` and cache them, replacing the
    /// previous set wholesale.
    pub async fn fetch_utxos(&self, address: &Address) -> Result<Vec<UnspentTransaction>, ProviderError> {
        let url = self.schema.url(&self.schema.utxos.path, address.as_str());
        let mapping = &self.schema.utxos;
        self.single_flight(
            CacheKey::Utxos,
            &url,
            |payload| normalize::decode_utxos(payload, mapping, address),
            |cache, backend, utxos| cache.store(CacheKey::Utxos, backend, utxos),
        )
        .await
    }

    /// Fetch and classify the transaction history of `address`.
    pub async fn fetch_history(&self, address: &Address) -> Result<Vec<HistoryEntry>, ProviderError> {
        let url = self.schema.url(&self.schema.history.path, address.as_str());
        let mapping = &self.schema.history;
        self.single_flight(
            CacheKey::Transactions,
            &url,
            |payload| normalize::decode_classified_history(payload, mapping, address.as_str()),
            |cache, backend, history| cache.store(CacheKey::Transactions, backend, history),
        )
        .await
    }

    /// Last cached balance; no I/O.
    pub fn cached_balance(&self) -> Option<u64> {
        self.cache.load_scalar(CacheKey::Balance)
    }

    /// Last cached UTXO set; no I/O.
    pub fn cached_utxos(&self) -> Option<Vec<UnspentTransaction>> {
        self.cache.load(CacheKey::Utxos)
    }

    /// Last cached history; no I/O.
    pub fn cached_history(&self) -> Option<Vec<HistoryEntry>> {
        self.cache.load(CacheKey::Transactions)
    }

    /// Cancel every in-flight fetch. Cancelled fetches return
    /// [`ProviderError::Cancelled`] and write nothing.
    pub fn cancel_all(&self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            for (key, entry) in inflight.drain() {
                debug!(key = %key, generation = entry.generation, "cancelling fetch");
                entry.token.cancel();
            }
        }
    }

    fn begin(&self, key: CacheKey) -> Result<(u64, CancellationToken), ProviderError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut inflight = self.lock_inflight()?;
        if let Some(previous) = inflight.insert(
            key,
            Inflight {
                generation,
                token: token.clone(),
            },
        ) {
            debug!(key = %key, superseded = previous.generation, generation, "superseding fetch");
            previous.token.cancel();
        }
        Ok((generation, token))
    }

    /// Persist `value` if `generation` is still the newest fetch of `key`.
    fn commit<T, P>(&self, key: CacheKey, generation: u64, value: &T, persist: P) -> Result<(), ProviderError>
    where
        P: FnOnce(&Cache, &str, &T) -> Result<(), ProviderError>,
    {
        let mut inflight = self.lock_inflight()?;
        match inflight.get(&key) {
            Some(entry) if entry.generation == generation && !entry.token.is_cancelled() => {
                let result = persist(&self.cache, &self.schema.name, value);
                inflight.remove(&key);
                result
            }
            _ => Err(ProviderError::Cancelled),
        }
    }

    /// Drop the in-flight marker for `generation` after a failed fetch.
    fn abandon(&self, key: CacheKey, generation: u64) {
        if let Ok(mut inflight) = self.inflight.lock() {
            if inflight.get(&key).is_some_and(|e| e.generation == generation) {
                inflight.remove(&key);
            }
        }
    }

    fn lock_inflight(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CacheKey, Inflight>>, ProviderError> {
        self.inflight
            .lock()
            .map_err(|_| ProviderError::Cache("in-flight table lock poisoned".to_string()))
    }

    async fn single_flight<T, F, P>(
        &self,
        key: CacheKey,
        url: &str,
        decode: F,
        persist: P,
    ) -> Result<T, ProviderError>
    where
        F: FnOnce(&Value) -> Result<T, ProviderError>,
        P: FnOnce(&Cache, &str, &T) -> Result<(), ProviderError>,
    {
        let (generation, token) = self.begin(key)?;
        info!(key = %key, backend = %self.schema.name, url, generation, "fetching");

        let result = self
            .fetch_and_decode(key, url, &token, decode)
            .await
            .and_then(|value| {
                self.commit(key, generation, &value, persist)?;
                Ok(value)
            });

        match &result {
            Ok(_) => debug!(key = %key, generation, "fetch committed"),
            Err(ProviderError::Cancelled) => {
                debug!(key = %key, generation, "fetch superseded");
            }
            Err(e) => {
                warn!(key = %key, backend = %self.schema.name, error = %e, "fetch failed; cache left untouched");
                self.abandon(key, generation);
            }
        }
        result
    }

    async fn fetch_and_decode<T, F>(
        &self,
        key: CacheKey,
        url: &str,
        token: &CancellationToken,
        decode: F,
    ) -> Result<T, ProviderError>
    where
        F: FnOnce(&Value) -> Result<T, ProviderError>,
    {
        let payload = cancellable(token, self.client.get_json(url)).await?;
        decode(&payload).inspect_err(|e| {
            warn!(key = %key, backend = %self.schema.name, reason = %e, "payload does not match schema");
        })
    }
}

/// Run `fut` unless `token` fires first.
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ProviderError::Cancelled),
        result = fut => result,
    }
}
