//! The wallet orchestrator.
//!
//! `Wallet` owns one key and one address and wires the provider layer to the
//! selection, building and signing stages. It holds no business logic of its
//! own beyond deciding what happens to change.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bch_primitives::ec::PrivateKey;
use bch_provider::{
    Broadcaster, Cache, CacheKey, CacheStore, DraftBroadcaster, FeeProvider, Fees,
    FileCacheStore, HistoryEntry, MemoryCacheStore, ProviderAdapter, RateProvider,
    RestBroadcaster,
};
use bch_script::Address;
use bch_transaction::{
    CooperativeSignatures, StandardTransactionBuilder, StandardTransactionSigner,
    StandardUtxoSelector, TransactionBuilder, TransactionError, TransactionSigner,
    UnspentTransaction, UtxoSelector,
};
use tracing::{info, warn};

use crate::config::WalletConfig;
use crate::pipeline::{PipelineState, SendPipeline};
use crate::WalletError;

/// Backend name recorded next to cache entries the wallet writes itself.
const WALLET_BACKEND: &str = "wallet";

/// Outcome of a send that reached the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Transaction id as reported by the backend, in display order.
    pub txid: String,
    /// Fee paid, in satoshis. Includes sub-dust change that was not created.
    pub fee: u64,
    /// Value of the change output, zero when none was created.
    pub change: u64,
    /// Broadcast hex; `None` for server-built transactions.
    pub raw_hex: Option<String>,
    pub pipeline: SendPipeline,
}

/// Split the selected value between payment, fee and change.
///
/// # Arguments
/// * `total` - value of the selected UTXOs
/// * `amount` - payment to the destination
/// * `fee` - fee computed by the selector
/// * `dust_threshold` - smallest change output worth creating
///
/// # Returns
/// `(fee, change)`. Change below `dust_threshold` is added to the fee and
/// reported as zero, so `amount + fee + change == total` always holds.
pub fn settle_change(
    total: u64,
    amount: u64,
    fee: u64,
    dust_threshold: u64,
) -> Result<(u64, u64), WalletError> {
    let change = amount
        .checked_add(fee)
        .and_then(|spent| total.checked_sub(spent))
        .ok_or(TransactionError::InsufficientFunds {
            required: amount.saturating_add(fee),
            available: total,
        })?;
    if change < dust_threshold {
        Ok((fee + change, 0))
    } else {
        Ok((fee, change))
    }
}

/// A single-address wallet.
pub struct Wallet<B = RestBroadcaster> {
    private_key: PrivateKey,
    address: Address,
    config: WalletConfig,
    cache: Cache,
    adapter: ProviderAdapter,
    broadcaster: B,
    fees: FeeProvider,
    rates: RateProvider,
    selector: StandardUtxoSelector,
    builder: StandardTransactionBuilder,
    signer: StandardTransactionSigner,
    last_send: Mutex<Option<SendPipeline>>,
}

impl<B> fmt::Debug for Wallet<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address.as_str())
            .field("backend", &self.adapter.schema().name)
            .finish_non_exhaustive()
    }
}

impl Wallet<RestBroadcaster> {
    /// Create a wallet over an explicit cache store.
    ///
    /// The key's WIF version byte is aligned with the configured network.
    pub fn new(private_key: PrivateKey, config: WalletConfig, store: Arc<dyn CacheStore>) -> Self {
        let broadcaster = RestBroadcaster::new(&config.provider);
        Self::assemble(private_key, config, store, broadcaster)
    }

    /// Create a wallet whose cache lives under `config.cache_dir`, in a
    /// directory named after the compressed public key. Without a
    /// `cache_dir` the cache is kept in memory.
    pub fn open(private_key: PrivateKey, config: WalletConfig) -> Result<Self, WalletError> {
        let store: Arc<dyn CacheStore> = match &config.cache_dir {
            Some(root) => {
                let wallet_id = hex::encode(private_key.pub_key().to_compressed());
                Arc::new(FileCacheStore::open(root, &wallet_id)?)
            }
            None => Arc::new(MemoryCacheStore::new()),
        };
        Ok(Self::new(private_key, config, store))
    }

    /// Import a WIF-encoded key, see [`Wallet::open`].
    pub fn from_wif(wif: &str, config: WalletConfig) -> Result<Self, WalletError> {
        Self::open(PrivateKey::from_wif(wif)?, config)
    }

    /// Reopen a wallet from the key a previous [`save`](Wallet::save) left
    /// in `store`.
    pub fn restore(store: Arc<dyn CacheStore>, config: WalletConfig) -> Result<Self, WalletError> {
        let wif: String = Cache::new(store.clone())
            .load(CacheKey::Wif)
            .ok_or(WalletError::KeyNotFound)?;
        let private_key = PrivateKey::from_wif(&wif)?;
        Ok(Self::new(private_key, config, store))
    }
}

impl<B> Wallet<B> {
    fn assemble(
        private_key: PrivateKey,
        config: WalletConfig,
        store: Arc<dyn CacheStore>,
        broadcaster: B,
    ) -> Self {
        let network = config.provider.network;
        let private_key = private_key.with_wif_prefix(network.wif_prefix());
        let address = Address::from_public_key(&private_key.pub_key(), network);
        let cache = Cache::new(store);
        let adapter = ProviderAdapter::new(&config.provider, cache.clone());
        let fees = FeeProvider::new(&config.market, &config.provider, cache.clone());
        let rates = RateProvider::new(&config.market, &config.provider, cache.clone());
        let selector = StandardUtxoSelector::new(config.fee_per_byte, config.size_model);
        let signer = StandardTransactionSigner::new(config.sighash_algorithm());
        info!(address = %address.as_str(), backend = %adapter.schema().name, "wallet opened");
        Self {
            private_key,
            address,
            config,
            cache,
            adapter,
            broadcaster,
            fees,
            rates,
            selector,
            builder: StandardTransactionBuilder::default(),
            signer,
            last_send: Mutex::new(None),
        }
    }

    /// Swap the broadcaster, keeping the key, cache and configuration.
    pub fn with_broadcaster<T>(self, broadcaster: T) -> Wallet<T> {
        Wallet {
            private_key: self.private_key,
            address: self.address,
            config: self.config,
            cache: self.cache,
            adapter: self.adapter,
            broadcaster,
            fees: self.fees,
            rates: self.rates,
            selector: self.selector,
            builder: self.builder,
            signer: self.signer,
            last_send: self.last_send,
        }
    }

    /// Persist the key as WIF under the `wif` cache entry.
    pub fn save(&self) -> Result<(), WalletError> {
        self.cache
            .store(CacheKey::Wif, WALLET_BACKEND, &self.private_key.to_wif())?;
        Ok(())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Every address the wallet controls; always exactly one.
    pub fn addresses(&self) -> Vec<Address> {
        vec![self.address.clone()]
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    /// Cached balance in satoshis; zero before the first reload.
    pub fn balance(&self) -> u64 {
        self.adapter.cached_balance().unwrap_or_default()
    }

    pub fn utxos(&self) -> Vec<UnspentTransaction> {
        self.adapter.cached_utxos().unwrap_or_default()
    }

    pub fn transactions(&self) -> Vec<HistoryEntry> {
        self.adapter.cached_history().unwrap_or_default()
    }

    pub fn fees(&self) -> Fees {
        self.fees.cached().unwrap_or_default()
    }

    pub fn rate_usd(&self) -> f64 {
        self.rates.cached_usd().unwrap_or_default()
    }

    pub fn rate_bch(&self) -> f64 {
        self.rates.cached_bch().unwrap_or_default()
    }

    pub async fn reload_balance(&self) -> Result<u64, WalletError> {
        Ok(self.adapter.fetch_balance(&self.address).await?)
    }

    pub async fn reload_utxos(&self) -> Result<Vec<UnspentTransaction>, WalletError> {
        Ok(self.adapter.fetch_utxos(&self.address).await?)
    }

    pub async fn reload_transactions(&self) -> Result<Vec<HistoryEntry>, WalletError> {
        Ok(self.adapter.fetch_history(&self.address).await?)
    }

    pub async fn reload_fees(&self) -> Result<Fees, WalletError> {
        Ok(self.fees.fetch().await?)
    }

    /// Refresh both exchange rates.
    ///
    /// # Returns
    /// `(usd, bch)`
    pub async fn reload_rates(&self) -> Result<(f64, f64), WalletError> {
        let usd = self.rates.fetch_usd().await?;
        let bch = self.rates.fetch_bch().await?;
        Ok((usd, bch))
    }

    /// Abort every in-flight reload.
    pub fn cancel_reloads(&self) {
        self.adapter.cancel_all();
    }

    /// Sign backend-computed digests with the wallet key.
    pub fn sign_hashes<S: AsRef<str>>(&self, hashes: &[S]) -> Result<CooperativeSignatures, WalletError> {
        Ok(bch_transaction::sign_hashes(hashes, &self.private_key)?)
    }

    /// Pipeline of the most recent send, in whatever state it ended.
    pub fn last_send(&self) -> Option<SendPipeline> {
        self.last_send
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, pipeline: &SendPipeline) {
        *self.last_send.lock().unwrap_or_else(PoisonError::into_inner) = Some(pipeline.clone());
    }

    /// Advance a submitted send to `Confirmed` once the network reports at
    /// least one confirmation for it.
    ///
    /// # Returns
    /// Whether the send is confirmed. History is re-fetched on every call.
    pub async fn check_confirmation(&self, report: &mut SendReport) -> Result<bool, WalletError> {
        if report.pipeline.state() == &PipelineState::Confirmed {
            return Ok(true);
        }
        let history = self.reload_transactions().await?;
        let confirmed = history
            .iter()
            .any(|entry| entry.hash.eq_ignore_ascii_case(&report.txid) && entry.confirmations > 0);
        if !confirmed {
            return Ok(false);
        }
        report.pipeline.advance(PipelineState::Confirmed)?;
        info!(txid = %report.txid, "send confirmed");
        self.record(&report.pipeline);
        Ok(true)
    }

    /// Close out a pipeline whose run returned an error.
    fn settle_failure(&self, pipeline: &mut SendPipeline, err: &WalletError) {
        if err.is_rejection() && pipeline.state() == &PipelineState::Submitted {
            if let Err(e) = pipeline.advance(PipelineState::Rejected) {
                pipeline.fail(e.to_string());
            }
        } else {
            pipeline.fail(err.to_string());
        }
        warn!(state = %pipeline.state(), error = %err, "send did not complete");
        self.record(pipeline);
    }
}

impl<B: Broadcaster> Wallet<B> {
    /// Pay `amount` satoshis to `to` from the cached UTXO set.
    ///
    /// Reload UTXOs first to spend the latest set. The pipeline of the
    /// attempt is kept for [`last_send`](Wallet::last_send) whether it
    /// succeeds or not.
    ///
    /// # Returns
    /// The report of a transaction the backend accepted. Selection and
    /// signing failures surface as `InsufficientFunds` / `SigningError`, a
    /// refusal by the network as `BroadcastRejected`.
    pub async fn send(&self, to: &Address, amount: u64) -> Result<SendReport, WalletError> {
        let mut pipeline = SendPipeline::new();
        match self.run_send(&mut pipeline, to, amount).await {
            Ok((txid, fee, change, raw_hex)) => {
                self.record(&pipeline);
                Ok(SendReport {
                    txid,
                    fee,
                    change,
                    raw_hex: Some(raw_hex),
                    pipeline,
                })
            }
            Err(err) => {
                self.settle_failure(&mut pipeline, &err);
                Err(err)
            }
        }
    }

    async fn run_send(
        &self,
        pipeline: &mut SendPipeline,
        to: &Address,
        amount: u64,
    ) -> Result<(String, u64, u64, String), WalletError> {
        let utxos = self.utxos();
        let selection = self.selector.select(&utxos, amount)?;
        pipeline.advance(PipelineState::Selected)?;

        let (fee, change) = settle_change(
            selection.total(),
            amount,
            selection.fee,
            self.config.dust_threshold,
        )?;
        let mut destinations = vec![(to.clone(), amount)];
        if change > 0 {
            destinations.push((self.address.clone(), change));
        }
        let unsigned = self.builder.build(&destinations, &selection.utxos)?;
        if unsigned.fee() != Some(fee) {
            return Err(TransactionError::InvalidTransaction(format!(
                "built transaction pays {:?}, expected fee {fee}",
                unsigned.fee()
            ))
            .into());
        }
        pipeline.advance(PipelineState::Built)?;

        let signed = self
            .signer
            .sign(unsigned, std::slice::from_ref(&self.private_key))?;
        signed.verify()?;
        pipeline.advance(PipelineState::Signed)?;

        let raw_hex = signed.to_hex();
        pipeline.advance(PipelineState::Submitted)?;
        let txid = self.broadcaster.broadcast(&raw_hex).await?;
        if txid != signed.tx_id_hex() {
            warn!(reported = %txid, local = %signed.tx_id_hex(), "backend reported a different txid");
        }
        info!(txid = %txid, amount, fee, change, to = %to.as_str(), "payment sent");
        Ok((txid, fee, change, raw_hex))
    }
}

impl<B: DraftBroadcaster> Wallet<B> {
    /// Pay `amount` satoshis to `to` through a server-built transaction.
    ///
    /// The backend selects inputs and builds the transaction; the wallet
    /// only signs the digests it hands back. The fee is the backend's quote.
    pub async fn send_cooperative(&self, to: &Address, amount: u64) -> Result<SendReport, WalletError> {
        let mut pipeline = SendPipeline::new();
        match self.run_cooperative(&mut pipeline, to, amount).await {
            Ok((txid, fee)) => {
                self.record(&pipeline);
                Ok(SendReport {
                    txid,
                    fee,
                    change: 0,
                    raw_hex: None,
                    pipeline,
                })
            }
            Err(err) => {
                self.settle_failure(&mut pipeline, &err);
                Err(err)
            }
        }
    }

    async fn run_cooperative(
        &self,
        pipeline: &mut SendPipeline,
        to: &Address,
        amount: u64,
    ) -> Result<(String, u64), WalletError> {
        if amount == 0 {
            return Err(TransactionError::InvalidTransaction("target value must be positive".to_string()).into());
        }
        let draft = self.broadcaster.create_draft(&self.address, to, amount).await?;
        pipeline.advance(PipelineState::Selected)?;
        pipeline.advance(PipelineState::Built)?;

        let signatures = self.sign_hashes(&draft.tosign)?;
        pipeline.advance(PipelineState::Signed)?;

        pipeline.advance(PipelineState::Submitted)?;
        let txid = self.broadcaster.submit_draft(&draft, &signatures).await?;
        info!(txid = %txid, amount, fee = draft.fee, to = %to.as_str(), "cooperative payment sent");
        Ok((txid, draft.fee))
    }
}

