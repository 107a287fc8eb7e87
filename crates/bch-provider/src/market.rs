//! Fee-rate and exchange-rate providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::{Cache, CacheKey};
use crate::client::RestClient;
use crate::error::ProviderError;
use crate::types::{Fees, ProviderConfig};

const MARKET_BACKEND: &str = "market";

/// Endpoints for market data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Recommended fees (`fastestFee`, `halfHourFee`, `hourFee`).
    pub fees_url: String,
    /// Ticker with a `USD.15m` field.
    pub ticker_url: String,
    /// Quote with a `data.quotes.USD.price` field.
    pub quote_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            fees_url: "https://bitcoinfees.earn.com/api/v1/fees/recommended".to_string(),
            ticker_url: "https://blockchain.info/ticker".to_string(),
            quote_url: "https://api.coinmarketcap.com/v2/ticker/1831/".to_string(),
        }
    }
}

/// Recommended fee rates, cached under `fees`.
#[derive(Debug, Clone)]
pub struct FeeProvider {
    url: String,
    client: RestClient,
    cache: Cache,
}

impl FeeProvider {
    pub fn new(market: &MarketConfig, config: &ProviderConfig, cache: Cache) -> Self {
        Self {
            url: market.fees_url.clone(),
            client: RestClient::new(config),
            cache,
        }
    }

    pub async fn fetch(&self) -> Result<Fees, ProviderError> {
        let payload = self.client.get_json(&self.url).await?;
        let fees: Fees = serde_json::from_value(payload)?;
        self.cache.store(CacheKey::Fees, MARKET_BACKEND, &fees)?;
        debug!(fastest = fees.fastest, half_hour = fees.half_hour, hour = fees.hour, "fees updated");
        Ok(fees)
    }

    pub fn cached(&self) -> Option<Fees> {
        self.cache.load(CacheKey::Fees)
    }
}

/// Exchange rates, cached under `rateUSD` and `rateBCH` as decimal strings.
#[derive(Debug, Clone)]
pub struct RateProvider {
    ticker_url: String,
    quote_url: String,
    client: RestClient,
    cache: Cache,
}

impl RateProvider {
    pub fn new(market: &MarketConfig, config: &ProviderConfig, cache: Cache) -> Self {
        Self {
            ticker_url: market.ticker_url.clone(),
            quote_url: market.quote_url.clone(),
            client: RestClient::new(config),
            cache,
        }
    }

    /// Fetch the 15-minute average USD price.
    pub async fn fetch_usd(&self) -> Result<f64, ProviderError> {
        self.fetch_rate(&self.ticker_url, "/USD/15m", CacheKey::RateUsd).await
    }

    /// Fetch the BCH price in USD.
    pub async fn fetch_bch(&self) -> Result<f64, ProviderError> {
        self.fetch_rate(&self.quote_url, "/data/quotes/USD/price", CacheKey::RateBch)
            .await
    }

    pub fn cached_usd(&self) -> Option<f64> {
        self.cache.load_scalar(CacheKey::RateUsd)
    }

    pub fn cached_bch(&self) -> Option<f64> {
        self.cache.load_scalar(CacheKey::RateBch)
    }

    async fn fetch_rate(&self, url: &str, pointer: &str, key: CacheKey) -> Result<f64, ProviderError> {
        let payload = self.client.get_json(url).await?;
        let rate = payload
            .pointer(pointer)
            .and_then(|v| match v {
                Value::String(s) => s.parse().ok(),
                other => other.as_f64(),
            })
            .ok_or_else(|| ProviderError::DecodeMismatch(format!("no rate at {pointer}")))?;
        self.cache.store_scalar(key, MARKET_BACKEND, &rate)?;
        debug!(key = %key, rate, "rate updated");
        Ok(rate)
    }
}
