use bch_primitives::chainhash::Hash;
use bch_primitives::ec::PrivateKey;
use bch_primitives::util::{BchReader, VarInt};
use proptest::prelude::*;

proptest! {
    #[test]
    fn hash_reversal_is_an_involution(bytes in prop::array::uniform32(any::<u8>())) {
        let h = Hash::new(bytes);
        prop_assert_eq!(h.reversed().reversed(), h);
        let parsed = Hash::from_hex(&h.to_string()).unwrap();
        prop_assert_eq!(parsed, h);
    }

    #[test]
    fn varint_decodes_what_it_encodes(v in any::<u64>()) {
        let bytes = VarInt(v).to_bytes();
        prop_assert_eq!(bytes.len(), VarInt(v).length());
        let mut reader = BchReader::new(&bytes);
        prop_assert_eq!(reader.read_varint().unwrap().value(), v);
    }

    #[test]
    fn wif_roundtrips(seed in prop::array::uniform32(1u8..), compressed in any::<bool>()) {
        let key = PrivateKey::from_bytes(&seed).unwrap().with_compressed(compressed);
        let back = PrivateKey::from_wif(&key.to_wif()).unwrap();
        prop_assert_eq!(back, key);
    }
}
