//! Which contracts and methods a contract may call.

use super::contract_group::decode_public_key;
use super::WildcardContainer;
use crate::contract_state::ContractState;
use crate::{Error, Result};
use neo_core::UInt160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Names the contracts a permission or trust applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractPermissionDescriptor {
    Wildcard,
    Hash(UInt160),
    /// Every contract in the group with this compressed public key.
    Group(Vec<u8>),
}

impl ContractPermissionDescriptor {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Parses the JSON form: `"*"`, a `0x`-prefixed hash or a hex public key.
    pub fn parse(s: &str) -> Result<Self> {
        match s.len() {
            _ if s == "*" => Ok(Self::Wildcard),
            42 => Ok(Self::Hash(UInt160::parse(s)?)),
            66 => {
                let key = hex::decode(s).map_err(|e| Error::format(e.to_string()))?;
                decode_public_key(&key)?;
                Ok(Self::Group(key))
            }
            _ => Err(Error::format(format!("invalid permission descriptor: {s}"))),
        }
    }
}

impl Serialize for ContractPermissionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Wildcard => serializer.serialize_str("*"),
            Self::Hash(hash) => serializer.serialize_str(&hash.to_string()),
            Self::Group(key) => serializer.serialize_str(&hex::encode(key)),
        }
    }
}

impl<'de> Deserialize<'de> for ContractPermissionDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// One entry of a manifest's `permissions` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPermission {
    pub contract: ContractPermissionDescriptor,
    pub methods: WildcardContainer<String>,
}

impl ContractPermission {
    /// Allows calling any method of any contract.
    pub fn default_wildcard() -> Self {
        Self {
            contract: ContractPermissionDescriptor::Wildcard,
            methods: WildcardContainer::create_wildcard(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.methods.values().iter().any(String::is_empty) {
            return Err(Error::format("permission lists an empty method name"));
        }
        if !self.methods.is_distinct() {
            return Err(Error::format("permission lists a method twice"));
        }
        Ok(())
    }

    /// Whether this permission covers calling `method` on `target`.
    pub fn is_allowed(&self, target: &ContractState, method: &str) -> bool {
        let contract_matches = match &self.contract {
            ContractPermissionDescriptor::Wildcard => true,
            ContractPermissionDescriptor::Hash(hash) => *hash == target.hash,
            ContractPermissionDescriptor::Group(key) => {
                target.manifest.groups.iter().any(|g| &g.pub_key == key)
            }
        };
        contract_matches && self.methods.contains(&method.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_json_forms() {
        let hash: ContractPermissionDescriptor =
            serde_json::from_value(json!("0xfffdc93764dbaddd97c48f252a53ea4643faa3fd")).unwrap();
        assert!(matches!(hash, ContractPermissionDescriptor::Hash(_)));
        assert_eq!(
            serde_json::to_value(&hash).unwrap(),
            json!("0xfffdc93764dbaddd97c48f252a53ea4643faa3fd")
        );
        let wildcard: ContractPermissionDescriptor = serde_json::from_value(json!("*")).unwrap();
        assert!(wildcard.is_wildcard());
        assert!(serde_json::from_value::<ContractPermissionDescriptor>(json!("0x12")).is_err());
    }

    #[test]
    fn test_permission_validation() {
        let permission: ContractPermission =
            serde_json::from_value(json!({ "contract": "*", "methods": ["a", "a"] })).unwrap();
        assert!(permission.validate().is_err());
        let permission: ContractPermission =
            serde_json::from_value(json!({ "contract": "*", "methods": [""] })).unwrap();
        assert!(permission.validate().is_err());
        assert!(ContractPermission::default_wildcard().validate().is_ok());
    }
}
