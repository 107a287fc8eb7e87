//! End-to-end tests for the wallet against mock backends.

use std::sync::{Arc, Mutex};

use bch_primitives::ec::PrivateKey;
use bch_provider::{
    BackendKind, Broadcaster, CacheStore, Direction, FileCacheStore, MarketConfig,
    MemoryCacheStore, ProviderConfig, ProviderError,
};
use bch_script::{Address, Network};
use bch_transaction::{SighashAlgorithm, Transaction, TransactionError};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::pipeline::PipelineState;
use crate::wallet::Wallet;

const WALLET: &str = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";
const WALLET_PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
const OTHER: &str = "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm";
const TXID: &str = "51262307251dc909e2eb759b0ce7bfd927e8d399d7abd5e0998406b60854a393";
const TOSIGN: &str = "9d5ed678fe57bcca610140957afab571e0c1a1a3e39d9b5aa1b1fe7e8f1c6f0a";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key() -> PrivateKey {
    PrivateKey::from_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap()
}

fn other() -> Address {
    Address::from_string(OTHER).unwrap()
}

fn config(kind: BackendKind, server: &MockServer) -> WalletConfig {
    WalletConfig {
        provider: ProviderConfig {
            backend: kind,
            network: Network::Mainnet,
            base_url: Some(server.uri()),
            api_token: None,
            timeout_secs: 5,
        },
        market: MarketConfig {
            fees_url: format!("{}/fees", server.uri()),
            ticker_url: format!("{}/ticker", server.uri()),
            quote_url: format!("{}/quote", server.uri()),
        },
        ..Default::default()
    }
}

fn wallet(kind: BackendKind, server: &MockServer) -> Wallet {
    Wallet::new(key(), config(kind, server), Arc::new(MemoryCacheStore::new()))
}

async fn mount_utxos(server: &MockServer, amounts: &[(u32, &str)]) {
    let utxos: Vec<Value> = amounts
        .iter()
        .map(|(vout, amount)| json!({"txid": TXID, "vout": vout, "amount": amount, "confirmations": 6}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/address/utxo/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "utxos": utxos })))
        .mount(server)
        .await;
}

async fn mount_push(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/rawtransactions/sendRawTransaction"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn history(confirmations: u64) -> Value {
    json!({
        "txs": [{
            "txid": TXID,
            "time": 1530000000,
            "confirmations": confirmations,
            "vin": [{"addr": WALLET}],
            "vout": [
                {"value": "0.0012", "scriptPubKey": {"addresses": [OTHER]}},
                {"value": "0.0001644", "scriptPubKey": {"addresses": [WALLET]}}
            ]
        }]
    })
}

#[tokio::test]
async fn test_send_spends_both_utxos_with_change() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(1, "0.001"), (0, "0.0005")]).await;
    mount_push(&server, ResponseTemplate::new(200).set_body_string(TXID)).await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    assert_eq!(wallet.reload_utxos().await.unwrap().len(), 2);

    let report = wallet.send(&other(), 120_000).await.unwrap();
    assert_eq!(report.txid, TXID);
    assert_eq!(report.fee, 13_560);
    assert_eq!(report.change, 16_440);
    assert_eq!(report.pipeline.state(), &PipelineState::Submitted);
    assert_eq!(
        report.pipeline.transitions(),
        &[
            PipelineState::Unfunded,
            PipelineState::Selected,
            PipelineState::Built,
            PipelineState::Signed,
            PipelineState::Submitted,
        ]
    );

    let raw_hex = report.raw_hex.clone().unwrap();
    let tx = Transaction::from_hex(&raw_hex).unwrap();
    assert_eq!(tx.inputs.len(), 2);
    // largest first
    assert_eq!(tx.inputs[0].previous_output.index, 1);
    assert_eq!(tx.inputs[1].previous_output.index, 0);
    assert_eq!(tx.inputs[0].previous_output.txid_hex(), TXID);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].value, 120_000);
    assert_eq!(tx.outputs[1].value, 16_440);
    assert!(tx.inputs.iter().all(|input| !input.signature_script.is_empty()));

    let requests = server.received_requests().await.unwrap();
    let push = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("push request");
    let body: Value = serde_json::from_slice(&push.body).unwrap();
    assert_eq!(body["tx"], raw_hex);

    assert_eq!(wallet.last_send(), Some(report.pipeline));
}

#[tokio::test]
async fn test_sub_dust_change_goes_to_fee() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(0, "0.0015")]).await;
    mount_push(&server, ResponseTemplate::new(200).set_body_string(TXID)).await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    wallet.reload_utxos().await.unwrap();

    // one input: 152 bytes at 60 sat/byte is 9120, leaving 380 of change
    let report = wallet.send(&other(), 140_500).await.unwrap();
    assert_eq!(report.change, 0);
    assert_eq!(report.fee, 9_500);

    let tx = Transaction::from_hex(report.raw_hex.as_deref().unwrap()).unwrap();
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].value, 140_500);
}

#[tokio::test]
async fn test_send_without_utxos_fails_in_unfunded() {
    init_tracing();
    let server = MockServer::start().await;
    let wallet = wallet(BackendKind::BitcoinCom, &server);

    let err = wallet.send(&other(), 1_000).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Transaction(TransactionError::InsufficientFunds { available: 0, .. })
    ));

    let pipeline = wallet.last_send().unwrap();
    assert!(matches!(pipeline.state(), PipelineState::Failed(_)));
    assert_eq!(pipeline.transitions().len(), 2);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_broadcast() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(1, "0.001"), (0, "0.0005")]).await;
    mount_push(
        &server,
        ResponseTemplate::new(400).set_body_string("{\"error\":\"txn-mempool-conflict\"}"),
    )
    .await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    wallet.reload_utxos().await.unwrap();

    let err = wallet.send(&other(), 120_000).await.unwrap_err();
    assert!(err.is_rejection());
    match err {
        WalletError::Provider(ProviderError::BroadcastRejected(body)) => {
            assert_eq!(body, "{\"error\":\"txn-mempool-conflict\"}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let pipeline = wallet.last_send().unwrap();
    assert_eq!(pipeline.state(), &PipelineState::Rejected);
    let transitions = pipeline.transitions();
    assert_eq!(transitions[transitions.len() - 2], PipelineState::Submitted);
}

#[tokio::test]
async fn test_network_failure_after_submission_is_failed() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(1, "0.001"), (0, "0.0005")]).await;
    mount_push(&server, ResponseTemplate::new(200)).await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    wallet.reload_utxos().await.unwrap();

    let err = wallet.send(&other(), 120_000).await.unwrap_err();
    assert!(matches!(err, WalletError::Provider(ProviderError::NetworkUnavailable(_))));
    assert!(matches!(wallet.last_send().unwrap().state(), PipelineState::Failed(_)));
}

#[tokio::test]
async fn test_check_confirmation() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(1, "0.001"), (0, "0.0005")]).await;
    mount_push(&server, ResponseTemplate::new(200).set_body_string(TXID)).await;
    Mock::given(method("GET"))
        .and(path(format!("/address/transactions/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(history(0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/address/transactions/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(history(2)))
        .mount(&server)
        .await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    wallet.reload_utxos().await.unwrap();
    let mut report = wallet.send(&other(), 120_000).await.unwrap();

    assert!(!wallet.check_confirmation(&mut report).await.unwrap());
    assert_eq!(report.pipeline.state(), &PipelineState::Submitted);

    assert!(wallet.check_confirmation(&mut report).await.unwrap());
    assert_eq!(report.pipeline.state(), &PipelineState::Confirmed);
    assert_eq!(wallet.last_send().unwrap().state(), &PipelineState::Confirmed);

    let entries = wallet.transactions();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].direction, Direction::Outgoing);
    assert_eq!(entries[0].value, 120_000);
}

#[tokio::test]
async fn test_cooperative_send() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/txs/new"))
        .and(body_partial_json(json!({
            "inputs": [{"addresses": [WALLET]}],
            "outputs": [{"addresses": [OTHER], "value": 50000}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "tx": {"fees": 1200, "hash": ""},
            "tosign": [TOSIGN]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/txs/send"))
        .and(body_partial_json(json!({ "pubkeys": [WALLET_PUBKEY] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "tx": {"hash": TXID} })))
        .mount(&server)
        .await;

    let wallet = wallet(BackendKind::Blockcypher, &server);
    let report = wallet.send_cooperative(&other(), 50_000).await.unwrap();
    assert_eq!(report.txid, TXID);
    assert_eq!(report.fee, 1200);
    assert_eq!(report.change, 0);
    assert!(report.raw_hex.is_none());
    assert_eq!(report.pipeline.state(), &PipelineState::Submitted);
    assert_eq!(report.pipeline.transitions().len(), 5);
}

#[tokio::test]
async fn test_cooperative_send_unsupported_backend() {
    init_tracing();
    let server = MockServer::start().await;
    let wallet = wallet(BackendKind::BitcoinCom, &server);

    let err = wallet.send_cooperative(&other(), 50_000).await.unwrap_err();
    assert!(matches!(err, WalletError::Provider(ProviderError::Unsupported { .. })));
    assert!(matches!(wallet.last_send().unwrap().state(), PipelineState::Failed(_)));
}

#[test]
fn test_sign_hashes_with_wallet_key() {
    let wallet = Wallet::new(key(), WalletConfig::default(), Arc::new(MemoryCacheStore::new()));
    let signatures = wallet.sign_hashes(&[TOSIGN, TOSIGN]).unwrap();
    assert_eq!(signatures.signatures.len(), 2);
    assert_eq!(signatures.public_keys, vec![WALLET_PUBKEY.to_string(); 2]);

    let err = wallet.sign_hashes(&["abcd"]).unwrap_err();
    assert!(matches!(err, WalletError::Transaction(TransactionError::SigningError(_))));
}

#[tokio::test]
async fn test_queries_read_cache_after_reload() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/details/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balanceSat": 150000, "balance": 0.0015})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fastestFee": 40, "halfHourFee": 20, "hourFee": 10})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"USD": {"15m": 6500.5, "last": 6501.0}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"quotes": {"USD": {"price": 512.25}}}})))
        .mount(&server)
        .await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    assert_eq!(wallet.balance(), 0);
    assert!(wallet.utxos().is_empty());
    assert_eq!(wallet.rate_usd(), 0.0);

    assert_eq!(wallet.reload_balance().await.unwrap(), 150_000);
    assert_eq!(wallet.balance(), 150_000);

    let fees = wallet.reload_fees().await.unwrap();
    assert_eq!(fees.fastest, 40);
    assert_eq!(wallet.fees(), fees);

    assert_eq!(wallet.reload_rates().await.unwrap(), (6500.5, 512.25));
    assert_eq!(wallet.rate_usd(), 6500.5);
    assert_eq!(wallet.rate_bch(), 512.25);

    assert_eq!(wallet.addresses(), vec![wallet.address().clone()]);
    assert_eq!(wallet.address().as_str(), WALLET);
}

#[tokio::test]
async fn test_failed_reload_keeps_cached_utxos() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/utxo/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"utxos": [{"txid": TXID, "vout": 0, "amount": "0.001"}]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/address/utxo/{WALLET}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"utxos": "unavailable"})))
        .mount(&server)
        .await;

    let wallet = wallet(BackendKind::BitcoinCom, &server);
    wallet.reload_utxos().await.unwrap();

    let err = wallet.reload_utxos().await.unwrap_err();
    assert!(matches!(err, WalletError::Provider(ProviderError::DecodeMismatch(_))));
    assert_eq!(wallet.utxos().len(), 1);
    assert_eq!(wallet.utxos()[0].value(), 100_000);
}

#[test]
fn test_save_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let config = WalletConfig {
        cache_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let wallet = Wallet::open(key(), config.clone()).unwrap();
    wallet.save().unwrap();

    let store: Arc<dyn CacheStore> = Arc::new(FileCacheStore::open(dir.path(), WALLET_PUBKEY).unwrap());
    let restored = Wallet::restore(store, config).unwrap();
    assert_eq!(restored.address(), wallet.address());
}

#[test]
fn test_restore_without_saved_key() {
    let err = Wallet::restore(Arc::new(MemoryCacheStore::new()), WalletConfig::default()).unwrap_err();
    assert!(matches!(err, WalletError::KeyNotFound));
}

#[test]
fn test_testnet_wallet_realigns_key() {
    let mut config = WalletConfig::default();
    config.provider.network = Network::Testnet;
    let store = Arc::new(MemoryCacheStore::new());

    let wallet = Wallet::from_wif("KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn", config.clone()).unwrap();
    assert_eq!(wallet.address().network(), Network::Testnet);

    let wallet = Wallet::new(key(), config.clone(), store.clone());
    wallet.save().unwrap();
    let restored = Wallet::restore(store, config).unwrap();
    assert_eq!(restored.address(), wallet.address());
    assert!(restored.address().as_str().starts_with(['m', 'n']));
}

#[derive(Default)]
struct RecordingBroadcaster {
    sent: Mutex<Vec<String>>,
}

impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(&self, raw_hex: &str) -> Result<String, ProviderError> {
        let tx = Transaction::from_hex(raw_hex)?;
        self.sent.lock().unwrap().push(raw_hex.to_string());
        Ok(tx.tx_id_hex())
    }
}

#[tokio::test]
async fn test_custom_broadcaster_and_legacy_digest() {
    init_tracing();
    let server = MockServer::start().await;
    mount_utxos(&server, &[(1, "0.001"), (0, "0.0005")]).await;

    let mut config = config(BackendKind::BitcoinCom, &server);
    config.sighash = Some(SighashAlgorithm::Legacy);
    let wallet = Wallet::new(key(), config, Arc::new(MemoryCacheStore::new()))
        .with_broadcaster(RecordingBroadcaster::default());
    wallet.reload_utxos().await.unwrap();

    let report = wallet.send(&other(), 120_000).await.unwrap();
    let raw_hex = report.raw_hex.unwrap();
    assert_eq!(report.txid, Transaction::from_hex(&raw_hex).unwrap().tx_id_hex());

    let tx = Transaction::from_hex(&raw_hex).unwrap();
    let sig_push = tx.inputs[0].signature_script.push_data_items().unwrap();
    // sighash byte is the last byte of the signature push
    assert_eq!(sig_push[0].last(), Some(&0x01));
}
