//! Native contracts.
//!
//! Native contracts are implemented by the host. Each one still has a NEF
//! script and a manifest so that contracts can call it like any other:
//! its script routes every method back here through
//! `System.Contract.CallNative`.

pub mod contract_management;
pub mod contract_method_metadata;
pub mod native_contract;
pub mod policy_contract;
pub mod std_lib;

pub use contract_management::ContractManagement;
pub use contract_method_metadata::{CallContext, ContractMethodMetadata};
pub use native_contract::{NativeCallContext, NativeContract, NativeContractBase, NATIVE_COMPILER};
pub use policy_contract::PolicyContract;
pub use std_lib::StdLib;

pub(crate) use native_contract::invoke;

use crate::Result;
use neo_core::UInt160;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

/// Every native contract, indexed by hash and id.
#[derive(Debug)]
pub struct NativeContractRegistry {
    contract_management: ContractManagement,
    std_lib: StdLib,
    policy: PolicyContract,
    by_hash: HashMap<UInt160, usize>,
}

impl NativeContractRegistry {
    /// Builds the contracts and assigns ids -1, -2, -3 in declaration order.
    pub fn new() -> Result<Self> {
        let mut registry = Self {
            contract_management: ContractManagement::new(-1)?,
            std_lib: StdLib::new(-2)?,
            policy: PolicyContract::new(-3)?,
            by_hash: HashMap::new(),
        };
        let hashes: Vec<UInt160> = registry.contracts().map(|c| c.hash()).collect();
        for (index, hash) in hashes.into_iter().enumerate() {
            registry.by_hash.insert(hash, index);
        }
        Ok(registry)
    }

    /// The contracts in id order, starting at -1.
    pub fn contracts(&self) -> impl Iterator<Item = &dyn NativeContract> {
        let contracts: [&dyn NativeContract; 3] =
            [&self.contract_management, &self.std_lib, &self.policy];
        contracts.into_iter()
    }

    pub fn get(&self, hash: &UInt160) -> Option<&dyn NativeContract> {
        let index = *self.by_hash.get(hash)?;
        self.contracts().nth(index)
    }

    pub fn get_by_id(&self, id: i32) -> Option<&dyn NativeContract> {
        self.contracts().find(|contract| contract.id() == id)
    }

    pub fn contract_management(&self) -> &ContractManagement {
        &self.contract_management
    }

    pub fn std_lib(&self) -> &StdLib {
        &self.std_lib
    }

    pub fn policy(&self) -> &PolicyContract {
        &self.policy
    }
}

static REGISTRY: Lazy<NativeContractRegistry> = Lazy::new(|| {
    let registry = NativeContractRegistry::new()
        .unwrap_or_else(|e| panic!("failed to build the native contracts: {e}"));
    debug!(contracts = registry.by_hash.len(), "native contracts registered");
    registry
});

/// The native contracts every engine dispatches to.
pub fn registry() -> &'static NativeContractRegistry {
    &REGISTRY
}

pub fn contract_management() -> &'static ContractManagement {
    REGISTRY.contract_management()
}

pub fn std_lib() -> &'static StdLib {
    REGISTRY.std_lib()
}

pub fn policy() -> &'static PolicyContract {
    REGISTRY.policy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_hashes() {
        let ids: Vec<i32> = registry().contracts().map(|c| c.id()).collect();
        assert_eq!(ids, vec![-1, -2, -3]);
        assert_eq!(
            std_lib().hash().to_string(),
            "0xacce6fd80d44e1796aa0c2c625e9e4e0ce39efc0"
        );
        for contract in registry().contracts() {
            let found = registry().get(&contract.hash()).map(|c| c.name());
            assert_eq!(found, Some(contract.name()));
            assert_eq!(
                registry().get_by_id(contract.id()).map(|c| c.hash()),
                Some(contract.hash())
            );
        }
        assert!(registry().get(&UInt160::zero()).is_none());
        assert!(registry().get_by_id(0).is_none());
    }

    #[test]
    fn test_native_scripts_route_to_call_native() {
        let call_native = crate::interop::selector(crate::interop::SYSTEM_CONTRACT_CALL_NATIVE);
        for contract in registry().contracts() {
            let base = contract.base();
            for descriptor in &base.manifest().abi.methods {
                let offset = descriptor.offset as usize;
                // PUSH0, then SYSCALL with its 4-byte operand.
                assert_eq!(base.script()[offset], neo_vm::OpCode::PUSH0 as u8);
                assert_eq!(
                    base.script()[offset + 2..offset + 6],
                    call_native.to_le_bytes()
                );
                assert!(base.method_at(offset + 1).is_some());
            }
        }
    }
}
