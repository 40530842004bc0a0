//! Contract manifest implementation.
//!
//! Represents the manifest of a smart contract which declares the features
//! and permissions it will use when deployed.

use super::{
    ContractAbi, ContractGroup, ContractPermission, ContractPermissionDescriptor,
    WildcardContainer,
};
use crate::contract_state::ContractState;
use crate::{Error, Result};
use neo_config::MAX_MANIFEST_LENGTH;
use neo_core::UInt160;
use neo_vm::ExecutionEngineLimits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents the manifest of a smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractManifest {
    pub name: String,
    pub groups: Vec<ContractGroup>,
    /// Reserved. Must be an empty object.
    pub features: Map<String, Value>,
    #[serde(rename = "supportedstandards")]
    pub supported_standards: Vec<String>,
    pub abi: ContractAbi,
    pub permissions: Vec<ContractPermission>,
    /// Contracts allowed to call this one with its own witness scope.
    pub trusts: WildcardContainer<ContractPermissionDescriptor>,
    /// Free-form metadata; `null` when absent.
    #[serde(default)]
    pub extra: Value,
}

impl ContractManifest {
    /// Maximum length of a manifest's JSON text.
    pub const MAX_LENGTH: usize = MAX_MANIFEST_LENGTH;

    /// A manifest with the given ABI that may call anything and trusts nobody.
    pub fn new(name: impl Into<String>, abi: ContractAbi) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            features: Map::new(),
            supported_standards: Vec::new(),
            abi,
            permissions: vec![ContractPermission::default_wildcard()],
            trusts: WildcardContainer::create(Vec::new()),
            extra: Value::Null,
        }
    }

    /// Parses and validates a manifest from its JSON text.
    pub fn parse(json: &[u8]) -> Result<Self> {
        if json.len() > Self::MAX_LENGTH {
            return Err(Error::format(format!(
                "manifest is {} bytes, the maximum is {}",
                json.len(),
                Self::MAX_LENGTH
            )));
        }
        let manifest: Self = serde_json::from_slice(json)
            .map_err(|e| Error::format(format!("invalid manifest: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks the structural rules every manifest must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::format("manifest name can't be empty"));
        }
        for (i, group) in self.groups.iter().enumerate() {
            if self.groups[..i].iter().any(|g| g.pub_key == group.pub_key) {
                return Err(Error::format("manifest lists a group twice"));
            }
        }
        if !self.features.is_empty() {
            return Err(Error::format("manifest features must be empty"));
        }
        for (i, standard) in self.supported_standards.iter().enumerate() {
            if standard.is_empty() || self.supported_standards[..i].contains(standard) {
                return Err(Error::format(format!("invalid supported standard: {standard:?}")));
            }
        }
        self.abi.validate()?;
        for (i, permission) in self.permissions.iter().enumerate() {
            permission.validate()?;
            if self.permissions[..i]
                .iter()
                .any(|p| p.contract == permission.contract)
            {
                return Err(Error::format("manifest lists a permission contract twice"));
            }
        }
        if !self.trusts.is_distinct() {
            return Err(Error::format("manifest lists a trust twice"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The JSON text of the manifest, which is also its stack item form.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::format(e.to_string()))
    }

    /// Whether the manifest fits in a stack item and every group signature
    /// verifies against `hash`.
    pub fn is_valid(&self, limits: &ExecutionEngineLimits, hash: &UInt160) -> bool {
        match self.to_json_bytes() {
            Ok(bytes) if bytes.len() <= limits.max_item_size as usize => {}
            _ => return false,
        }
        self.groups.iter().all(|g| g.is_valid(hash))
    }

    /// Whether some permission allows calling `method` on `target`.
    pub fn can_call(&self, target: &ContractState, method: &str) -> bool {
        self.permissions.iter().any(|p| p.is_allowed(target, method))
    }
}
