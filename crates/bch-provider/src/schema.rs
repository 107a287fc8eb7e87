//! Declarative backend schemas.
//!
//! Every backend is described as data: where its endpoints live and which
//! JSON pointers hold each canonical field. A single
//! [`ProviderAdapter`](crate::ProviderAdapter) interprets the schema, so adding a
//! backend means writing a `BackendSchema`, not a new adapter.
//!
//! Pointers inside a list item (`txid`, `value`, ...) are relative to the
//! item; list pointers are relative to the payload root. The empty pointer
//! `""` addresses the root itself.

use bch_script::Network;
use serde::{Deserialize, Serialize};

use crate::types::BackendKind;

/// Unit an amount field is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountUnit {
    /// Integer smallest-unit amounts; passed through.
    Satoshis,
    /// Decimal coin amounts; multiplied by 10^8 and truncated.
    Coins,
}

/// Byte order of transaction-id strings returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashOrder {
    /// Conventional txid display order; reversed into internal order.
    Display,
    /// Already in internal (wire) order.
    Internal,
}

/// Where the balance lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMapping {
    /// URL template relative to the base URL; `{address}` is substituted.
    pub path: String,
    pub balance: String,
    pub unit: AmountUnit,
}

/// How to read the unspent outputs of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoMapping {
    pub path: String,
    pub list: String,
    /// The backend omits the list for an address with no unspent outputs,
    /// so a missing list reads as empty.
    #[serde(default)]
    pub list_optional: bool,
    pub txid: String,
    pub index: String,
    pub value: String,
    /// Locking script hex. When absent the P2PKH script of the queried
    /// address is used.
    pub script: Option<String>,
    pub unit: AmountUnit,
    pub hash_order: HashOrder,
}

/// How to read the transaction history of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMapping {
    pub path: String,
    pub list: String,
    pub hash: String,
    pub timestamp: String,
    pub confirmations: String,
    pub inputs: String,
    /// Address field of an input; a string or an array of strings.
    pub input_addresses: String,
    pub outputs: String,
    /// Address field of an output; a string or an array of strings.
    pub output_addresses: String,
    pub output_value: String,
    pub unit: AmountUnit,
}

/// How to push a signed raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMapping {
    pub path: String,
    /// Name of the JSON body field carrying the raw hex.
    pub body_field: String,
    /// Pointer to the txid in a JSON response. When absent, or when the
    /// response is not JSON, the trimmed body is the txid.
    pub txid: Option<String>,
    /// Field whose presence marks a rejection.
    pub error_field: String,
}

/// Two-phase (server-built) transaction endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPhaseMapping {
    pub new_path: String,
    pub send_path: String,
    pub tosign: String,
    /// Fee the backend charged, in satoshis; absent reads as zero.
    pub fee: String,
    pub txid: String,
    pub error_field: String,
}

/// Complete description of one block-explorer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSchema {
    /// Backend name, recorded next to every cache entry it writes.
    pub name: String,
    pub base_url: String,
    pub balance: BalanceMapping,
    pub utxos: UtxoMapping,
    pub history: HistoryMapping,
    pub broadcast: BroadcastMapping,
    pub two_phase: Option<TwoPhaseMapping>,
}

impl BackendSchema {
    /// Built-in schema for `kind` on `network`.
    pub fn for_backend(kind: BackendKind, network: Network) -> Self {
        match kind {
            BackendKind::Blockcypher => Self::blockcypher(network),
            BackendKind::BitcoinCom => Self::bitcoin_com(network),
        }
    }

    /// Blockcypher: integer satoshis, `addresses` arrays, two-phase support.
    pub fn blockcypher(network: Network) -> Self {
        let base_url = match network {
            Network::Mainnet => "https://api.blockcypher.com/v1/btc/main",
            Network::Testnet => "https://api.blockcypher.com/v1/btc/test3",
        };
        BackendSchema {
            name: "blockcypher".to_string(),
            base_url: base_url.to_string(),
            balance: BalanceMapping {
                path: "addrs/{address}/balance".to_string(),
                balance: "/balance".to_string(),
                unit: AmountUnit::Satoshis,
            },
            utxos: UtxoMapping {
                path: "addrs/{address}?unspentOnly=true&includeScript=true".to_string(),
                list: "/txrefs".to_string(),
                list_optional: true,
                txid: "/tx_hash".to_string(),
                index: "/tx_output_n".to_string(),
                value: "/value".to_string(),
                script: Some("/script".to_string()),
                unit: AmountUnit::Satoshis,
                hash_order: HashOrder::Display,
            },
            history: HistoryMapping {
                path: "addrs/{address}/full?txlimit=100".to_string(),
                list: "/txs".to_string(),
                hash: "/hash".to_string(),
                timestamp: "/received".to_string(),
                confirmations: "/confirmations".to_string(),
                inputs: "/inputs".to_string(),
                input_addresses: "/addresses".to_string(),
                outputs: "/outputs".to_string(),
                output_addresses: "/addresses".to_string(),
                output_value: "/value".to_string(),
                unit: AmountUnit::Satoshis,
            },
            broadcast: BroadcastMapping {
                path: "txs/push".to_string(),
                body_field: "tx".to_string(),
                txid: Some("/tx/hash".to_string()),
                error_field: "error".to_string(),
            },
            two_phase: Some(TwoPhaseMapping {
                new_path: "txs/new".to_string(),
                send_path: "txs/send".to_string(),
                tosign: "/tosign".to_string(),
                fee: "/tx/fees".to_string(),
                txid: "/tx/hash".to_string(),
                error_field: "errors".to_string(),
            }),
        }
    }

    /// Bitcoin.com: insight-style payloads with decimal coin amounts.
    pub fn bitcoin_com(network: Network) -> Self {
        let base_url = match network {
            Network::Mainnet => "https://rest.bitcoin.com/v2",
            Network::Testnet => "https://trest.bitcoin.com/v2",
        };
        BackendSchema {
            name: "bitcoin.com".to_string(),
            base_url: base_url.to_string(),
            balance: BalanceMapping {
                path: "address/details/{address}".to_string(),
                balance: "/balanceSat".to_string(),
                unit: AmountUnit::Satoshis,
            },
            utxos: UtxoMapping {
                path: "address/utxo/{address}".to_string(),
                list: "/utxos".to_string(),
                list_optional: false,
                txid: "/txid".to_string(),
                index: "/vout".to_string(),
                value: "/amount".to_string(),
                script: None,
                unit: AmountUnit::Coins,
                hash_order: HashOrder::Display,
            },
            history: HistoryMapping {
                path: "address/transactions/{address}".to_string(),
                list: "/txs".to_string(),
                hash: "/txid".to_string(),
                timestamp: "/time".to_string(),
                confirmations: "/confirmations".to_string(),
                inputs: "/vin".to_string(),
                input_addresses: "/addr".to_string(),
                outputs: "/vout".to_string(),
                output_addresses: "/scriptPubKey/addresses".to_string(),
                output_value: "/value".to_string(),
                unit: AmountUnit::Coins,
            },
            broadcast: BroadcastMapping {
                path: "rawtransactions/sendRawTransaction".to_string(),
                body_field: "tx".to_string(),
                txid: None,
                error_field: "error".to_string(),
            },
            two_phase: None,
        }
    }

    /// Replace the base URL, keeping every mapping.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Expand a path template against the base URL.
    ///
    /// # Arguments
    /// * `template` - path relative to the base URL, may contain `{address}`
    /// * `address` - substituted for `{address}`
    pub fn url(&self, template: &str, address: &str) -> String {
        let path = template.replace("{address}", address);
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_expansion() {
        let schema = BackendSchema::blockcypher(Network::Testnet);
        let url = schema.url(&schema.balance.path, "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn");
        assert_eq!(
            url,
            "https://api.blockcypher.com/v1/btc/test3/addrs/mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn/balance"
        );
    }

    #[test]
    fn test_base_url_override_trims_slashes() {
        let schema = BackendSchema::bitcoin_com(Network::Mainnet).with_base_url("http://127.0.0.1:9/");
        assert_eq!(schema.url("/address/utxo/{address}", "x"), "http://127.0.0.1:9/address/utxo/x");
    }

    #[test]
    fn test_schema_is_plain_data() {
        let schema = BackendSchema::bitcoin_com(Network::Mainnet);
        let json = serde_json::to_string(&schema).unwrap();
        let back: BackendSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
        assert!(back.two_phase.is_none());
        assert_eq!(back.utxos.unit, AmountUnit::Coins);

        let mut value = serde_json::to_value(BackendSchema::blockcypher(Network::Mainnet)).unwrap();
        assert_eq!(value["utxos"]["list_optional"], true);
        if let Some(utxos) = value["utxos"].as_object_mut() {
            utxos.remove("list_optional");
        }
        let strict: BackendSchema = serde_json::from_value(value).unwrap();
        assert!(!strict.utxos.list_optional);
    }

    #[test]
    fn test_for_backend() {
        let schema = BackendSchema::for_backend(BackendKind::Blockcypher, Network::Mainnet);
        assert_eq!(schema.name, "blockcypher");
        assert!(schema.two_phase.is_some());
    }
}
