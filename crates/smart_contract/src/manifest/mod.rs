//! Contract manifests: ABI, groups, permissions and trusts.

mod contract_abi;
mod contract_group;
mod contract_manifest;
mod contract_parameter_type;
mod contract_permission;
mod wildcard_container;

pub use contract_abi::{
    ContractAbi, ContractEventDescriptor, ContractMethodDescriptor, ContractParameterDefinition,
};
pub use contract_group::{ContractGroup, PUBLIC_KEY_LENGTH};
pub use contract_manifest::ContractManifest;
pub use contract_parameter_type::ContractParameterType;
pub use contract_permission::{ContractPermission, ContractPermissionDescriptor};
pub use wildcard_container::WildcardContainer;
