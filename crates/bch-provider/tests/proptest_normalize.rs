use proptest::prelude::*;
use serde_json::json;

use bch_provider::normalize::{self, classify, LedgerTransaction};
use bch_provider::{BackendSchema, Direction, HashOrder};
use bch_script::{Address, Network};

const WALLET: &str = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";
const OTHER: &str = "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm";

fn arb_address_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop_oneof![Just(WALLET.to_string()), Just(OTHER.to_string())], 0..3)
}

fn arb_ledger_tx() -> impl Strategy<Value = LedgerTransaction> {
    (
        prop::collection::vec(arb_address_set(), 0..4),
        prop::collection::vec((arb_address_set(), 0u64..1_000_000_000), 0..4),
    )
        .prop_map(|(inputs, outputs)| LedgerTransaction {
            inputs,
            outputs,
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn coin_strings_convert_exactly(sats in 0u64..2_100_000_000_000_000) {
        let coins = format!("{}.{:08}", sats / 100_000_000, sats % 100_000_000);
        prop_assert_eq!(normalize::coins_to_satoshis(&coins).unwrap(), sats);
    }

    #[test]
    fn display_txid_roundtrips(bytes in prop::array::uniform32(any::<u8>())) {
        let display = hex::encode(bytes);
        let hash = normalize::decode_txid(&display, HashOrder::Display).unwrap();
        let reversed = hash.reversed();
        prop_assert_eq!(reversed.as_bytes(), &bytes);
        prop_assert_eq!(hash.to_string(), display);
    }

    #[test]
    fn classified_value_never_exceeds_outputs(tx in arb_ledger_tx()) {
        let entry = classify(&tx, WALLET);
        let total: u64 = tx.outputs.iter().map(|(_, v)| v).sum();
        prop_assert!(entry.value <= total);

        let spends = tx.inputs.iter().any(|set| set.iter().any(|a| a == WALLET));
        prop_assert_eq!(entry.direction == Direction::Outgoing, spends);
    }

    #[test]
    fn utxo_decode_is_idempotent(
        items in prop::collection::vec(
            (prop::array::uniform32(any::<u8>()), 0u32..10, 1u64..10_000_000),
            0..8,
        )
    ) {
        let schema = BackendSchema::blockcypher(Network::Mainnet);
        let address = Address::from_string(WALLET).unwrap();
        let txrefs: Vec<_> = items
            .iter()
            .map(|(hash, index, value)| json!({
                "tx_hash": hex::encode(hash),
                "tx_output_n": index,
                "value": value,
            }))
            .collect();
        let payload = json!({ "txrefs": txrefs });

        let first = normalize::decode_utxos(&payload, &schema.utxos, &address).unwrap();
        let second = normalize::decode_utxos(&payload, &schema.utxos, &address).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), items.len());
        for (utxo, (_, index, value)) in first.iter().zip(items.iter()) {
            prop_assert_eq!(utxo.outpoint.index, *index);
            prop_assert_eq!(utxo.value(), *value);
        }
    }
}
