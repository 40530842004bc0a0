//! Contract state management.
//!
//! A [`ContractState`] is what contract management stores for every deployed
//! contract, and what native contracts expose for themselves.

use crate::interoperable::fields_of;
use crate::manifest::ContractManifest;
use crate::nef_file::NefFile;
use crate::{Error, Interoperable, Result};
use neo_core::UInt160;
use neo_io::SerializableExt;
use neo_vm::StackItem;
use serde_json::{json, Value};
use std::any::Any;

/// Represents the state of a deployed smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContractState {
    /// Positive for deployed contracts, negative for native ones.
    pub id: i32,

    /// Number of times the contract has been updated.
    pub update_counter: u16,

    /// Fixed at deployment; updates never change it.
    pub hash: UInt160,

    pub nef: NefFile,

    pub manifest: ContractManifest,
}

impl ContractState {
    pub fn new(id: i32, hash: UInt160, nef: NefFile, manifest: ContractManifest) -> Self {
        Self {
            id,
            update_counter: 0,
            hash,
            nef,
            manifest,
        }
    }

    pub fn script(&self) -> &[u8] {
        &self.nef.script
    }

    /// Whether this contract's manifest allows calling `method` on `target`.
    pub fn can_call(&self, target: &ContractState, method: &str) -> bool {
        self.manifest.can_call(target, method)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "updatecounter": self.update_counter,
            "hash": self.hash.to_string(),
            "nef": self.nef.to_json(),
            "manifest": self.manifest.to_json(),
        })
    }
}

impl Interoperable for ContractState {
    fn from_stack_item(&mut self, item: &StackItem) -> Result<()> {
        let fields = fields_of(item, "ContractState")?;
        let [id, update_counter, hash, nef, manifest] = fields.as_slice() else {
            return Err(Error::format(format!(
                "ContractState expects 5 fields, found {}",
                fields.len()
            )));
        };
        self.id = i32::try_from(&id.get_integer()?)
            .map_err(|_| Error::format("contract id out of range"))?;
        self.update_counter = u16::try_from(&update_counter.get_integer()?)
            .map_err(|_| Error::format("update counter out of range"))?;
        self.hash = UInt160::from_bytes(&hash.get_span()?)?;
        self.nef = NefFile::parse(&nef.get_span()?)?;
        self.manifest = ContractManifest::parse(&manifest.get_span()?)?;
        Ok(())
    }

    fn to_stack_item(&self) -> Result<StackItem> {
        Ok(StackItem::new_array(vec![
            StackItem::from(self.id),
            StackItem::from(self.update_counter),
            StackItem::from(self.hash.to_array().to_vec()),
            StackItem::from(self.nef.to_array()?),
            StackItem::from(self.manifest.to_json_bytes()?),
        ]))
    }

    fn clone_box(&self) -> Box<dyn Interoperable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ContractAbi, ContractMethodDescriptor, ContractParameterType};
    use crate::storage::StorageItem;

    fn sample_state() -> ContractState {
        let nef = NefFile::new("test", "", vec![], vec![0x11, 0x40]).unwrap();
        let abi = ContractAbi {
            methods: vec![ContractMethodDescriptor {
                name: "main".into(),
                parameters: vec![],
                return_type: ContractParameterType::Integer,
                offset: 0,
                safe: true,
            }],
            events: vec![],
        };
        ContractState::new(1, UInt160::from([9u8; 20]), nef, ContractManifest::new("Sample", abi))
    }

    #[test]
    fn test_stack_item_roundtrip() {
        let state = sample_state();
        let item = state.to_stack_item().unwrap();
        let mut decoded = ContractState::default();
        decoded.from_stack_item(&item).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_persists_through_storage_item() {
        let mut state = sample_state();
        state.update_counter = 3;
        let stored = StorageItem::from_interoperable(Box::new(state.clone()));
        let mut reloaded = StorageItem::new(stored.value().unwrap());
        assert_eq!(*reloaded.get_interoperable::<ContractState>().unwrap(), state);
    }

    #[test]
    fn test_rejects_short_arrays() {
        let mut state = ContractState::default();
        let item = StackItem::new_array(vec![StackItem::from(1)]);
        assert!(state.from_stack_item(&item).is_err());
    }
}
