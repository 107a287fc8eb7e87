//! Transaction submission: raw pushes and the two-phase draft protocol.

use std::future::Future;

use bch_primitives::chainhash::Hash;
use bch_script::Address;
use bch_transaction::{CooperativeSignatures, TransactionError};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::{RawResponse, RestClient};
use crate::error::ProviderError;
use crate::schema::BackendSchema;
use crate::types::{Draft, ProviderConfig};

/// Submits fully signed transactions.
pub trait Broadcaster {
    /// Push a hex-encoded signed transaction.
    ///
    /// # Returns
    /// The transaction id reported by the backend, in display order.
    fn broadcast(&self, raw_hex: &str) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// Backends that build the transaction server-side and hand back the
/// per-input hashes to sign.
pub trait DraftBroadcaster: Broadcaster {
    /// Ask the backend to build a transaction paying `amount` from `from` to `to`.
    fn create_draft(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> impl Future<Output = Result<Draft, ProviderError>> + Send;

    /// Return signatures for a draft and get the final txid.
    fn submit_draft(
        &self,
        draft: &Draft,
        signatures: &CooperativeSignatures,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

/// Broadcaster speaking a backend's REST push and two-phase endpoints.
#[derive(Debug, Clone)]
pub struct RestBroadcaster {
    schema: BackendSchema,
    client: RestClient,
}

impl RestBroadcaster {
    pub fn new(config: &ProviderConfig) -> Self {
        let schema = BackendSchema::for_backend(config.backend, config.network);
        Self::with_schema(schema, config)
    }

    pub fn with_schema(schema: BackendSchema, config: &ProviderConfig) -> Self {
        let schema = match &config.base_url {
            Some(url) => schema.with_base_url(url.clone()),
            None => schema,
        };
        Self {
            schema,
            client: RestClient::new(config),
        }
    }

    /// Push a raw transaction, see [`Broadcaster::broadcast`].
    pub async fn push(&self, raw_hex: &str) -> Result<String, ProviderError> {
        let mapping = &self.schema.broadcast;
        let url = self.schema.url(&mapping.path, "");
        let mut body = serde_json::Map::new();
        body.insert(mapping.body_field.clone(), Value::String(raw_hex.to_string()));

        let resp = self.client.post_json(&url, &Value::Object(body)).await?;
        let json = self.check(resp, &mapping.error_field)?;
        let txid = match (&mapping.txid, json) {
            (Some(pointer), Reply::Json(json)) => json.pointer(pointer).and_then(Value::as_str).map(str::to_string),
            (_, Reply::Json(Value::String(txid))) => Some(txid),
            (_, Reply::Json(_)) => None,
            (_, Reply::Text(text)) => Some(text),
        };
        let txid = txid.ok_or_else(|| ProviderError::DecodeMismatch("no txid in push response".to_string()))?;
        let txid = validate_txid(&txid)?;
        info!(backend = %self.schema.name, txid = %txid, "transaction broadcast");
        Ok(txid)
    }

    /// Create a server-built draft, see [`DraftBroadcaster::create_draft`].
    pub async fn new_draft(&self, from: &Address, to: &Address, amount: u64) -> Result<Draft, ProviderError> {
        let mapping = self.two_phase("create draft")?;
        let url = self.schema.url(&mapping.new_path, "");
        let request = json!({
            "inputs": [{ "addresses": [from.as_str()] }],
            "outputs": [{ "addresses": [to.as_str()], "value": amount }],
        });

        let resp = self.client.post_json(&url, &request).await?;
        let body = match self.check(resp, &mapping.error_field)? {
            Reply::Json(body) => body,
            Reply::Text(text) => {
                return Err(ProviderError::DecodeMismatch(format!("draft is not JSON: {text}")));
            }
        };
        let tosign = body
            .pointer(&mapping.tosign)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::DecodeMismatch(format!("draft without {}", mapping.tosign)))?
            .iter()
            .map(|h| {
                h.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ProviderError::DecodeMismatch(format!("tosign entry is not a string: {h}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fee = body.pointer(&mapping.fee).and_then(Value::as_u64).unwrap_or_default();

        info!(backend = %self.schema.name, inputs = tosign.len(), fee, "draft created");
        Ok(Draft { tosign, fee, body })
    }

    /// Submit signatures for a draft, see [`DraftBroadcaster::submit_draft`].
    pub async fn send_draft(
        &self,
        draft: &Draft,
        signatures: &CooperativeSignatures,
    ) -> Result<String, ProviderError> {
        let mapping = self.two_phase("submit draft")?;
        if signatures.signatures.len() != draft.tosign.len()
            || signatures.public_keys.len() != draft.tosign.len()
        {
            return Err(TransactionError::SigningError(format!(
                "draft needs {} signatures, got {} signatures and {} public keys",
                draft.tosign.len(),
                signatures.signatures.len(),
                signatures.public_keys.len()
            ))
            .into());
        }

        let mut body = draft.body.clone();
        let object = body
            .as_object_mut()
            .ok_or_else(|| ProviderError::DecodeMismatch("draft body is not an object".to_string()))?;
        object.insert("signatures".to_string(), json!(signatures.signatures));
        object.insert("pubkeys".to_string(), json!(signatures.public_keys));

        let url = self.schema.url(&mapping.send_path, "");
        let resp = self.client.post_json(&url, &body).await?;
        let txid = match self.check(resp, &mapping.error_field)? {
            Reply::Json(json) => json.pointer(&mapping.txid).and_then(Value::as_str).map(str::to_string),
            Reply::Text(_) => None,
        }
        .ok_or_else(|| ProviderError::DecodeMismatch(format!("no txid at {}", mapping.txid)))?;

        let txid = validate_txid(&txid)?;
        info!(backend = %self.schema.name, txid = %txid, "draft submitted");
        Ok(txid)
    }

    fn two_phase(&self, operation: &'static str) -> Result<&crate::schema::TwoPhaseMapping, ProviderError> {
        self.schema
            .two_phase
            .as_ref()
            .ok_or_else(|| ProviderError::Unsupported {
                backend: self.schema.name.clone(),
                operation,
            })
    }

    /// Map a submission response to a reply or a verbatim rejection.
    fn check(&self, resp: RawResponse, error_field: &str) -> Result<Reply, ProviderError> {
        if !resp.is_success() {
            warn!(backend = %self.schema.name, status = resp.status, body = %resp.body, "submission rejected");
            return Err(ProviderError::BroadcastRejected(resp.body));
        }
        let text = resp.body.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::NetworkUnavailable("empty submission response".to_string()));
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => {
                let rejected = json
                    .get(error_field)
                    .is_some_and(|e| !e.is_null() && e != &Value::Array(Vec::new()));
                if rejected {
                    warn!(backend = %self.schema.name, body = %resp.body, "submission rejected");
                    return Err(ProviderError::BroadcastRejected(resp.body));
                }
                Ok(Reply::Json(json))
            }
            Err(_) => Ok(Reply::Text(text)),
        }
    }
}

enum Reply {
    Json(Value),
    Text(String),
}

fn validate_txid(txid: &str) -> Result<String, ProviderError> {
    let txid = txid.trim().trim_matches('"');
    Hash::from_hex(txid)
        .map(|_| txid.to_ascii_lowercase())
        .map_err(|_| ProviderError::DecodeMismatch(format!("invalid txid in response: {txid}")))
}

impl Broadcaster for RestBroadcaster {
    async fn broadcast(&self, raw_hex: &str) -> Result<String, ProviderError> {
        self.push(raw_hex).await
    }
}

impl DraftBroadcaster for RestBroadcaster {
    async fn create_draft(&self, from: &Address, to: &Address, amount: u64) -> Result<Draft, ProviderError> {
        self.new_draft(from, to, amount).await
    }

    async fn submit_draft(
        &self,
        draft: &Draft,
        signatures: &CooperativeSignatures,
    ) -> Result<String, ProviderError> {
        self.send_draft(draft, signatures).await
    }
}
