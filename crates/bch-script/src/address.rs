//! Legacy Base58Check P2PKH addresses.
//!
//! Equality compares the encoded string, which is what history
//! classification relies on.

use std::fmt;
use std::str::FromStr;

use bch_primitives::ec::PublicKey;
use bch_primitives::hash::sha256d;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ScriptError;

const MAINNET_P2PKH: u8 = 0x00;
const TESTNET_P2PKH: u8 = 0x6f;

/// Which chain an address or backend endpoint belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Version byte of a P2PKH address on this network.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => MAINNET_P2PKH,
            Network::Testnet => TESTNET_P2PKH,
        }
    }

    /// Version byte of a WIF private key on this network.
    pub fn wif_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => bch_primitives::ec::MAINNET_WIF_PREFIX,
            Network::Testnet => bch_primitives::ec::TESTNET_WIF_PREFIX,
        }
    }
}

/// A P2PKH address.
#[derive(Clone, Debug)]
pub struct Address {
    encoded: String,
    public_key_hash: [u8; 20],
    network: Network,
}

impl Address {
    /// Parse a Base58Check address string.
    ///
    /// # Arguments
    /// * `addr` - The encoded address.
    ///
    /// # Returns
    /// The address, or an error for bad characters, length, checksum or version.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|e| ScriptError::InvalidAddress(format!("'{}': {}", addr, e)))?;
        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }
        if decoded[21..] != sha256d(&decoded[..21])[..4] {
            return Err(ScriptError::EncodingChecksumFailed);
        }
        let network = match decoded[0] {
            MAINNET_P2PKH => Network::Mainnet,
            TESTNET_P2PKH => Network::Testnet,
            version => {
                return Err(ScriptError::UnsupportedAddress {
                    address: addr.to_string(),
                    version,
                })
            }
        };
        let mut public_key_hash = [0u8; 20];
        public_key_hash.copy_from_slice(&decoded[1..21]);
        Ok(Address {
            encoded: addr.to_string(),
            public_key_hash,
            network,
        })
    }

    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        let mut payload = Vec::with_capacity(25);
        payload.push(network.p2pkh_version());
        payload.extend_from_slice(hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        Address {
            encoded: bs58::encode(&payload).into_string(),
            public_key_hash: *hash,
            network,
        }
    }

    /// The address controlled by `key`, using the key's own serialization form.
    pub fn from_public_key(key: &PublicKey, network: Network) -> Self {
        Self::from_public_key_hash(&key.hash160(), network)
    }

    pub fn public_key_hash(&self) -> &[u8; 20] {
        &self.public_key_hash
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_string(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bch_primitives::ec::PrivateKey;

    #[test]
    fn test_from_string_mainnet_and_testnet() {
        let main = Address::from_string("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr").unwrap();
        let test = Address::from_string("mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd").unwrap();
        assert_eq!(main.network(), Network::Mainnet);
        assert_eq!(test.network(), Network::Testnet);
        assert_eq!(main.public_key_hash(), test.public_key_hash());
        assert_eq!(
            hex::encode(main.public_key_hash()),
            "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b"
        );
        assert_ne!(main, test);
    }

    #[test]
    fn test_encode_matches_parse() {
        let pkh: [u8; 20] = hex::decode("8fe80c75c9560e8b56ed64ea3c26e18d2c52211b")
            .unwrap()
            .try_into()
            .unwrap();
        let addr = Address::from_public_key_hash(&pkh, Network::Testnet);
        assert_eq!(addr.to_string(), "mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd");
    }

    #[test]
    fn test_from_public_key_generator() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = PrivateKey::from_bytes(&bytes).unwrap();
        let compressed = Address::from_public_key(&key.pub_key(), Network::Mainnet);
        assert_eq!(compressed.as_str(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        let uncompressed =
            Address::from_public_key(&key.with_compressed(false).pub_key(), Network::Mainnet);
        assert_eq!(uncompressed.as_str(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn test_rejects_bad_checksum_and_length() {
        assert!(matches!(
            Address::from_string("1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMs"),
            Err(ScriptError::EncodingChecksumFailed) | Err(ScriptError::InvalidAddressLength(_))
        ));
        assert!(Address::from_string("1E7uc").is_err());
        assert!(Address::from_string("0OIl").is_err());
    }

    #[test]
    fn test_network_serde() {
        assert_eq!(serde_json::to_string(&Network::Testnet).unwrap(), "\"testnet\"");
        let n: Network = serde_json::from_str("\"mainnet\"").unwrap();
        assert_eq!(n, Network::Mainnet);
    }
}
