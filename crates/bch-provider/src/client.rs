//! Thin JSON-over-HTTP client shared by the adapter, broadcaster and market
//! data providers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::types::ProviderConfig;

/// A completed request: status code and body text.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    client: reqwest::Client,
    api_token: Option<String>,
}

impl RestClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "http client configuration rejected, using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            api_token: config.api_token.clone(),
        }
    }

    /// GET a JSON document.
    ///
    /// 2xx bodies are parsed; an empty body is `NetworkUnavailable`, a
    /// non-JSON body is `DecodeMismatch`.
    pub async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .headers(self.build_headers())
            .query(&self.token_query())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Err(ProviderError::NetworkUnavailable(format!("empty response from {url}")));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// POST a JSON body; the caller interprets status and body.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, ProviderError> {
        debug!(url, "POST");
        let resp = self
            .client
            .post(url)
            .headers(self.build_headers())
            .query(&self.token_query())
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }

    fn token_query(&self) -> Vec<(&'static str, String)> {
        self.api_token
            .iter()
            .map(|token| ("token", token.clone()))
            .collect()
    }

    /// Build common headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}
