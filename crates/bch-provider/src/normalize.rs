//! Normalization of backend payloads into the canonical ledger model.
//!
//! Decoding is all-or-nothing: either every item of a payload maps cleanly
//! or the whole decode fails with [`ProviderError::DecodeMismatch`]. Fields
//! that are merely absent (or `null`) take their zero value.

use std::str::FromStr;

use bch_primitives::chainhash::Hash;
use bch_script::{Address, Script};
use bch_transaction::template::p2pkh;
use bch_transaction::{Outpoint, TransactionOutput, UnspentTransaction};
use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{AmountUnit, BalanceMapping, HashOrder, HistoryMapping, UtxoMapping};
use crate::types::{Direction, HistoryEntry};

/// Satoshis per coin.
pub const SATOSHIS_PER_COIN: u64 = 100_000_000;

/// A history transaction reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerTransaction {
    pub hash: String,
    pub timestamp: String,
    pub confirmations: u64,
    /// Address set of each input, in order.
    pub inputs: Vec<Vec<String>>,
    /// Address set and satoshi value of each output, in order.
    pub outputs: Vec<(Vec<String>, u64)>,
}

fn mismatch(msg: impl Into<String>) -> ProviderError {
    ProviderError::DecodeMismatch(msg.into())
}

/// Resolve a JSON pointer; `null` counts as absent.
fn lookup<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer).filter(|v| !v.is_null())
}

fn list<'a>(payload: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, ProviderError> {
    match lookup(payload, pointer) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(mismatch(format!("{pointer} is not an array: {other}"))),
        None => Err(mismatch(format!("missing list {pointer}"))),
    }
}

/// Like [`list`] but a missing list is empty.
fn optional_list<'a>(item: &'a Value, pointer: &str) -> Result<&'a [Value], ProviderError> {
    match lookup(item, pointer) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(mismatch(format!("{pointer} is not an array: {other}"))),
        None => Ok(&[][..]),
    }
}

/// Convert a decimal coin amount to satoshis, truncating sub-satoshi digits.
///
/// # Arguments
/// * `text` - decimal string such as `"0.00150000"` or `"1e-8"`
///
/// # Returns
/// The amount in satoshis, or `DecodeMismatch` for negative or malformed input.
pub fn coins_to_satoshis(text: &str) -> Result<u64, ProviderError> {
    decimal_to_satoshis(text, AmountUnit::Coins)
}

fn decimal_to_satoshis(text: &str, unit: AmountUnit) -> Result<u64, ProviderError> {
    let amount = BigDecimal::from_str(text.trim())
        .map_err(|e| mismatch(format!("invalid amount {text:?}: {e}")))?;
    if amount < BigDecimal::from(0) {
        return Err(mismatch(format!("negative amount {text}")));
    }
    let scaled = match unit {
        AmountUnit::Satoshis => amount,
        AmountUnit::Coins => amount * BigDecimal::from(SATOSHIS_PER_COIN),
    };
    scaled
        .with_scale(0)
        .to_u64()
        .ok_or_else(|| mismatch(format!("amount out of range {text}")))
}

/// Read an amount field in the given unit. Absent fields are zero.
pub fn amount(value: Option<&Value>, unit: AmountUnit) -> Result<u64, ProviderError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => match (unit, n.as_u64()) {
            (AmountUnit::Satoshis, Some(sats)) => Ok(sats),
            _ => decimal_to_satoshis(&n.to_string(), unit),
        },
        Some(Value::String(s)) => decimal_to_satoshis(s, unit),
        Some(other) => Err(mismatch(format!("amount is not numeric: {other}"))),
    }
}

fn integer(value: Option<&Value>) -> Result<u64, ProviderError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| mismatch(format!("not an unsigned integer: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| mismatch(format!("not an unsigned integer: {s:?}"))),
        Some(other) => Err(mismatch(format!("not an unsigned integer: {other}"))),
    }
}

fn text(value: Option<&Value>) -> Result<String, ProviderError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(mismatch(format!("not a string: {other}"))),
    }
}

/// An address field may be one string or an array of strings.
fn addresses(value: Option<&Value>) -> Result<Vec<String>, ProviderError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(format!("address is not a string: {v}")))
            })
            .collect(),
        Some(other) => Err(mismatch(format!("invalid address field: {other}"))),
    }
}

/// Decode a transaction id string into internal byte order.
pub fn decode_txid(txid: &str, order: HashOrder) -> Result<Hash, ProviderError> {
    let decoded = match order {
        HashOrder::Display => Hash::from_hex(txid),
        HashOrder::Internal => Hash::from_internal_hex(txid),
    };
    decoded.map_err(|e| mismatch(format!("invalid txid {txid:?}: {e}")))
}

/// Decode an address balance in satoshis.
pub fn decode_balance(payload: &Value, mapping: &BalanceMapping) -> Result<u64, ProviderError> {
    let field = lookup(payload, &mapping.balance)
        .ok_or_else(|| mismatch(format!("missing balance {}", mapping.balance)))?;
    amount(Some(field), mapping.unit)
}

/// Decode the unspent outputs of `address`.
pub fn decode_utxos(
    payload: &Value,
    mapping: &UtxoMapping,
    address: &Address,
) -> Result<Vec<UnspentTransaction>, ProviderError> {
    let fallback_script = p2pkh::lock(address);
    let items = if mapping.list_optional {
        optional_list(payload, &mapping.list)?
    } else {
        list(payload, &mapping.list)?.as_slice()
    };

    items
        .iter()
        .map(|item| -> Result<UnspentTransaction, ProviderError> {
            if !item.is_object() {
                return Err(mismatch(format!("utxo is not an object: {item}")));
            }
            let txid = lookup(item, &mapping.txid)
                .and_then(Value::as_str)
                .ok_or_else(|| mismatch(format!("utxo without txid {}", mapping.txid)))?;
            let hash = decode_txid(txid, mapping.hash_order)?;
            let index = u32::try_from(integer(lookup(item, &mapping.index))?)
                .map_err(|_| mismatch("output index exceeds u32"))?;
            let value = amount(lookup(item, &mapping.value), mapping.unit)?;

            let script_hex = match &mapping.script {
                Some(pointer) => text(lookup(item, pointer))?,
                None => String::new(),
            };
            let locking_script = if script_hex.is_empty() {
                fallback_script.clone()
            } else {
                Script::from_hex(&script_hex)
                    .map_err(|e| mismatch(format!("invalid script: {e}")))?
            };

            Ok(UnspentTransaction::new(
                TransactionOutput::new(value, locking_script),
                Outpoint::new(hash, index),
            ))
        })
        .collect()
}

/// Decode history transactions without classifying them.
pub fn decode_history(
    payload: &Value,
    mapping: &HistoryMapping,
) -> Result<Vec<LedgerTransaction>, ProviderError> {
    list(payload, &mapping.list)?
        .iter()
        .map(|item| -> Result<LedgerTransaction, ProviderError> {
            if !item.is_object() {
                return Err(mismatch(format!("transaction is not an object: {item}")));
            }
            let inputs = optional_list(item, &mapping.inputs)?
                .iter()
                .map(|input| addresses(lookup(input, &mapping.input_addresses)))
                .collect::<Result<Vec<_>, _>>()?;
            let outputs = optional_list(item, &mapping.outputs)?
                .iter()
                .map(|output| -> Result<(Vec<String>, u64), ProviderError> {
                    Ok((
                        addresses(lookup(output, &mapping.output_addresses))?,
                        amount(lookup(output, &mapping.output_value), mapping.unit)?,
                    ))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(LedgerTransaction {
                hash: text(lookup(item, &mapping.hash))?,
                timestamp: text(lookup(item, &mapping.timestamp))?,
                confirmations: integer(lookup(item, &mapping.confirmations))?,
                inputs,
                outputs,
            })
        })
        .collect()
}

/// Classify a transaction relative to `wallet`.
///
/// Outgoing when the wallet address appears among any input's addresses.
/// Outgoing value sums the outputs that do not pay the wallet; incoming
/// value sums the outputs that do. A self-payment is therefore outgoing
/// with value zero.
pub fn classify(tx: &LedgerTransaction, wallet: &str) -> HistoryEntry {
    let owns = |set: &[String]| set.iter().any(|a| a == wallet);

    let direction = if tx.inputs.iter().any(|set| owns(set)) {
        Direction::Outgoing
    } else {
        Direction::Incoming
    };

    let value = tx
        .outputs
        .iter()
        .filter(|(set, _)| match direction {
            Direction::Incoming => owns(set),
            Direction::Outgoing => !owns(set),
        })
        .fold(0u64, |acc, (_, v)| acc.saturating_add(*v));

    let from = tx
        .inputs
        .iter()
        .rev()
        .find_map(|set| set.first().cloned())
        .unwrap_or_default();
    let to = tx
        .outputs
        .iter()
        .rev()
        .find_map(|(set, _)| set.first().cloned())
        .unwrap_or_default();

    HistoryEntry {
        timestamp: tx.timestamp.clone(),
        direction,
        hash: tx.hash.clone(),
        from,
        to,
        value,
        confirmations: tx.confirmations,
    }
}

/// Decode and classify a history payload for `wallet`.
pub fn decode_classified_history(
    payload: &Value,
    mapping: &HistoryMapping,
    wallet: &str,
) -> Result<Vec<HistoryEntry>, ProviderError> {
    Ok(decode_history(payload, mapping)?
        .iter()
        .map(|tx| classify(tx, wallet))
        .collect())
}
