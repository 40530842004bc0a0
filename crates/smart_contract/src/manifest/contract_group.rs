//! A set of mutually trusted contracts, identified by a public key and a
//! signature over the contract hash.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use neo_core::UInt160;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Length of a compressed secp256r1 point.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Parses a compressed secp256r1 public key.
pub(crate) fn decode_public_key(bytes: &[u8]) -> Result<VerifyingKey> {
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(Error::format(format!(
            "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    VerifyingKey::from_sec1_bytes(bytes).map_err(|e| Error::format(format!("invalid public key: {e}")))
}

/// A manifest group entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGroup {
    /// Compressed public key of the group.
    pub pub_key: Vec<u8>,
    /// Signature of the contract hash, verifiable with `pub_key`.
    pub signature: Vec<u8>,
}

impl ContractGroup {
    pub fn new(pub_key: Vec<u8>, signature: Vec<u8>) -> Self {
        Self { pub_key, signature }
    }

    /// Whether the signature is a valid secp256r1 signature of `hash`.
    pub fn is_valid(&self, hash: &UInt160) -> bool {
        let Ok(key) = decode_public_key(&self.pub_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        key.verify(hash.as_bytes(), &signature).is_ok()
    }
}

#[derive(Serialize, Deserialize)]
struct ContractGroupJson {
    pubkey: String,
    signature: String,
}

impl Serialize for ContractGroup {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ContractGroupJson {
            pubkey: hex::encode(&self.pub_key),
            signature: STANDARD.encode(&self.signature),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContractGroup {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = ContractGroupJson::deserialize(deserializer)?;
        let pub_key = hex::decode(&json.pubkey).map_err(serde::de::Error::custom)?;
        decode_public_key(&pub_key).map_err(serde::de::Error::custom)?;
        let signature = STANDARD
            .decode(json.signature.as_bytes())
            .map_err(serde::de::Error::custom)?;
        Ok(Self { pub_key, signature })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;

    fn signed_group(hash: &UInt160) -> ContractGroup {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let signature: Signature = key.sign(hash.as_bytes());
        let pub_key = key.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        ContractGroup::new(pub_key, signature.to_bytes().to_vec())
    }

    #[test]
    fn test_signature_verification() {
        let hash = UInt160::from([3u8; 20]);
        let group = signed_group(&hash);
        assert!(group.is_valid(&hash));
        assert!(!group.is_valid(&UInt160::from([4u8; 20])));

        let mut broken = group.clone();
        broken.signature.truncate(10);
        assert!(!broken.is_valid(&hash));
    }

    #[test]
    fn test_json_roundtrip() {
        let group = signed_group(&UInt160::zero());
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["pubkey"].as_str().unwrap().len(), 66);
        let parsed: ContractGroup = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, group);
    }

    #[test]
    fn test_rejects_bad_public_key() {
        let json = serde_json::json!({ "pubkey": "02", "signature": "" });
        assert!(serde_json::from_value::<ContractGroup>(json).is_err());
    }
}
