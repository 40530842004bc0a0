//! Loading and calling contracts.

use super::{ApplicationEngine, ExecutionContext, ExecutionContextState};
use crate::contract_state::ContractState;
use crate::contract_task::{ContractTask, ContractTaskAwaiter};
use crate::manifest::{ContractMethodDescriptor, ContractParameterType};
use crate::native;
use crate::{Error, Result};
use neo_config::Hardfork;
use neo_core::UInt160;
use neo_vm::{CallFlags, StackItem};
use std::rc::Rc;

impl ApplicationEngine {
    /// Calls `method` of the contract at `hash` the way `System.Contract.Call`
    /// does: the callee returns exactly one value to the caller, `Null` for
    /// void methods.
    pub fn call_contract(
        &mut self,
        hash: UInt160,
        method: &str,
        flags: CallFlags,
        args: Vec<StackItem>,
    ) -> Result<()> {
        if method.starts_with('_') {
            return Err(Error::argument(format!(
                "method name {method} can't start with '_'"
            )));
        }
        let (contract, descriptor) = self.resolve_method(&hash, method, args.len())?;
        let has_return_value = descriptor.return_type != ContractParameterType::Void;
        let context =
            self.call_contract_internal(contract, &descriptor, flags, has_return_value, args)?;
        context.state.is_dynamic_call = true;
        Ok(())
    }

    /// Calls a contract on behalf of a native contract. The returned task
    /// completes when the callee returns.
    pub fn call_from_native_contract(
        &mut self,
        calling_script_hash: UInt160,
        hash: UInt160,
        method: &str,
        args: Vec<StackItem>,
    ) -> Result<ContractTask> {
        let (contract, descriptor) = self.resolve_method(&hash, method, args.len())?;
        let has_return_value = descriptor.return_type != ContractParameterType::Void;
        let awaiter = ContractTaskAwaiter::new();
        let context = self.call_contract_internal(
            contract,
            &descriptor,
            CallFlags::ALL,
            has_return_value,
            args,
        )?;
        context.state.calling_script_hash = Some(calling_script_hash);
        context.state.awaiter = Some(awaiter.clone());
        Ok(ContractTask::pending(awaiter))
    }

    fn resolve_method(
        &self,
        hash: &UInt160,
        method: &str,
        argument_count: usize,
    ) -> Result<(ContractState, ContractMethodDescriptor)> {
        let contract = native::contract_management()
            .get_contract(self.snapshot(), hash)?
            .ok_or_else(|| Error::state(format!("called contract {hash} does not exist")))?;
        let descriptor = contract
            .manifest
            .abi
            .get_method(method, argument_count as i32)
            .cloned()
            .ok_or_else(|| {
                Error::state(format!(
                    "method \"{method}\" with {argument_count} parameter(s) doesn't exist in the contract {hash}"
                ))
            })?;
        Ok((contract, descriptor))
    }

    fn call_contract_internal(
        &mut self,
        contract: ContractState,
        method: &ContractMethodDescriptor,
        mut flags: CallFlags,
        has_return_value: bool,
        args: Vec<StackItem>,
    ) -> Result<&mut ExecutionContext> {
        if native::policy().is_blocked(self.snapshot(), &contract.hash)? {
            return Err(Error::state(format!(
                "the contract {} has been blocked",
                contract.hash
            )));
        }
        let (caller_hash, calling_flags, executing) = {
            let current = self.require_current_context()?;
            (
                current.script_hash(),
                current.call_flags(),
                current.state.contract.clone(),
            )
        };
        if method.safe {
            flags.remove(CallFlags::WRITE_STATES | CallFlags::ALLOW_NOTIFY);
        } else {
            let executing = if self.is_hardfork_enabled(Hardfork::Domovoi) {
                executing
            } else {
                native::contract_management().get_contract(self.snapshot(), &caller_hash)?
            };
            if let Some(executing) = executing {
                if !executing.can_call(&contract, &method.name) {
                    return Err(Error::permission(format!(
                        "cannot call method {} of contract {} from contract {caller_hash}",
                        method.name, contract.hash
                    )));
                }
            }
        }
        if args.len() != method.parameters.len() {
            return Err(Error::argument(format!(
                "method {} expects {} arguments, {} given",
                method.name,
                method.parameters.len(),
                args.len()
            )));
        }
        if has_return_value != (method.return_type != ContractParameterType::Void) {
            return Err(Error::state("the return value type does not match"));
        }
        let context = self.load_contract(contract, method, flags & calling_flags)?;
        context.state.calling_script_hash = Some(caller_hash);
        for arg in args.into_iter().rev() {
            context.evaluation_stack.push(arg);
        }
        Ok(context)
    }

    /// Loads `contract` positioned at `method` with the given flags.
    pub fn load_contract(
        &mut self,
        contract: ContractState,
        method: &ContractMethodDescriptor,
        flags: CallFlags,
    ) -> Result<&mut ExecutionContext> {
        let rvcount = if method.return_type == ContractParameterType::Void {
            0
        } else {
            1
        };
        let offset = usize::try_from(method.offset)
            .map_err(|_| Error::state(format!("method {} has a negative offset", method.name)))?;
        let script: Rc<[u8]> = Rc::from(contract.script());
        let state = ExecutionContextState {
            script_hash: contract.hash,
            call_flags: flags,
            contract: Some(contract),
            ..Default::default()
        };
        self.load_context(ExecutionContext::new(script, offset, Some(rvcount), state))?;
        self.current_context_mut()
    }
}
