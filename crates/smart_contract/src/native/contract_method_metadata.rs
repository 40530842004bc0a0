//! Declarations of native contract methods.

use crate::interop::{InteropParameterDescriptor, InteropParameterType, ParameterValidator};
use crate::manifest::{ContractMethodDescriptor, ContractParameterDefinition};
use neo_config::Hardfork;
use neo_vm::CallFlags;

/// What a native method handler gets besides its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallContext {
    None,
    /// The engine's snapshot.
    Snapshot,
    /// The engine itself.
    Engine,
}

/// A native contract method: its ABI, fees and required flags.
///
/// Built once per contract with the builder methods, for example
///
/// ```ignore
/// ContractMethodMetadata::new("isBlocked", CallContext::Snapshot)
///     .param("account", InteropParameterType::Hash160)
///     .returns(InteropParameterType::Boolean)
///     .cpu_fee(1 << 15)
///     .flags(CallFlags::READ_STATES)
/// ```
#[derive(Debug, Clone)]
pub struct ContractMethodMetadata {
    pub name: &'static str,
    pub call_context: CallContext,
    pub parameters: Vec<InteropParameterDescriptor>,
    pub return_type: InteropParameterType,
    pub cpu_fee: i64,
    pub storage_fee: i64,
    pub required_call_flags: CallFlags,
    pub active_in: Option<Hardfork>,
}

impl ContractMethodMetadata {
    pub fn new(name: &'static str, call_context: CallContext) -> Self {
        Self {
            name,
            call_context,
            parameters: Vec::new(),
            return_type: InteropParameterType::Void,
            cpu_fee: 0,
            storage_fee: 0,
            required_call_flags: CallFlags::NONE,
            active_in: None,
        }
    }

    pub fn param(mut self, name: &'static str, parameter_type: InteropParameterType) -> Self {
        self.parameters
            .push(InteropParameterDescriptor::new(name, parameter_type));
        self
    }

    /// Declares a parameter whose values must pass `validator` before the
    /// handler runs.
    pub fn validated_param(
        mut self,
        name: &'static str,
        parameter_type: InteropParameterType,
        validator: impl ParameterValidator + 'static,
    ) -> Self {
        self.parameters.push(
            InteropParameterDescriptor::new(name, parameter_type).with_validator(validator),
        );
        self
    }

    pub fn returns(mut self, return_type: InteropParameterType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn cpu_fee(mut self, fee: i64) -> Self {
        self.cpu_fee = fee;
        self
    }

    pub fn storage_fee(mut self, fee: i64) -> Self {
        self.storage_fee = fee;
        self
    }

    pub fn flags(mut self, flags: CallFlags) -> Self {
        self.required_call_flags = flags;
        self
    }

    pub fn active_in(mut self, hardfork: Hardfork) -> Self {
        self.active_in = Some(hardfork);
        self
    }

    /// A method is safe when it needs nothing beyond reading state and
    /// calling other contracts.
    pub fn is_safe(&self) -> bool {
        self.required_call_flags
            .difference(CallFlags::READ_ONLY)
            .is_empty()
    }

    /// The ABI entry of the method, starting at `offset` in the contract
    /// script.
    pub fn descriptor(&self, offset: usize) -> ContractMethodDescriptor {
        ContractMethodDescriptor {
            name: self.name.to_string(),
            parameters: self
                .parameters
                .iter()
                .map(|p| {
                    ContractParameterDefinition::new(
                        p.name,
                        p.parameter_type.to_contract_parameter_type(),
                    )
                })
                .collect(),
            return_type: self.return_type.to_contract_parameter_type(),
            offset: offset as i32,
            safe: self.is_safe(),
        }
    }
}
