//! The application engine.
//!
//! Runs scripts against a [`DataCache`] snapshot, charging gas for every
//! instruction, syscall and native call. The instruction loop covers the
//! push, stack, `SYSCALL` and `RET` opcodes; everything else a contract
//! does goes through the interop services and native contracts.

mod contract;
mod execution_context;
mod gas;
mod op_code_prices;
mod runtime;

pub use execution_context::{ExecutionContext, ExecutionContextState};
pub use op_code_prices::op_code_price;
pub use runtime::{LogEventArgs, NotifyEventArgs};

use crate::data_cache::DataCache;
use crate::interop::{self, Arguments, InteropValue};
use crate::native;
use crate::{Error, Result};
use neo_config::{Hardfork, ProtocolSettings};
use neo_core::UInt160;
use neo_vm::{
    CallFlags, EvaluationStack, ExecutionEngineLimits, Instruction, OpCode, StackItem, VMState,
    VmError,
};
use num_bigint::BigInt;
use tracing::{debug, trace, warn};

/// Represents the triggers for running smart contracts.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    /// Before a block is persisted. Native contracts are initialized here.
    OnPersist = 0x01,
    /// After a block is persisted.
    PostPersist = 0x02,
    /// Checking a witness.
    Verification = 0x20,
    /// Running a transaction's script.
    Application = 0x40,
}

/// The transaction a script runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Accounts that signed the transaction. The first one is the sender.
    pub signers: Vec<UInt160>,
}

impl Transaction {
    pub fn new(signers: Vec<UInt160>) -> Self {
        Self { signers }
    }

    pub fn sender(&self) -> Option<UInt160> {
        self.signers.first().copied()
    }
}

/// Executes scripts with gas accounting, interop services and native contracts.
pub struct ApplicationEngine {
    trigger: TriggerType,
    container: Option<Transaction>,
    snapshot: DataCache,
    persisting_block_index: u32,
    settings: ProtocolSettings,
    limits: ExecutionEngineLimits,
    gas_limit: i64,
    fee_consumed: i64,
    exec_fee_factor: i64,
    storage_price: i64,
    invocation_stack: Vec<ExecutionContext>,
    result_stack: EvaluationStack,
    entry_script_hash: Option<UInt160>,
    notifications: Vec<NotifyEventArgs>,
    logs: Vec<LogEventArgs>,
    state: VMState,
    fault: Option<Error>,
}

impl std::fmt::Debug for ApplicationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationEngine")
            .field("trigger", &self.trigger)
            .field("state", &self.state)
            .field("fee_consumed", &self.fee_consumed)
            .field("gas_limit", &self.gas_limit)
            .field("invocation_depth", &self.invocation_stack.len())
            .finish()
    }
}

impl ApplicationEngine {
    /// Creates an engine over `snapshot`.
    ///
    /// The execution fee factor and storage price are read from the policy
    /// contract's storage; before genesis they fall back to `settings`.
    pub fn new(
        trigger: TriggerType,
        container: Option<Transaction>,
        snapshot: DataCache,
        persisting_block_index: u32,
        settings: ProtocolSettings,
        gas_limit: i64,
    ) -> Self {
        let policy = native::policy();
        let exec_fee_factor = policy
            .get_exec_fee_factor(&snapshot)
            .unwrap_or(settings.initial_exec_fee_factor);
        let storage_price = policy
            .get_storage_price(&snapshot)
            .unwrap_or(settings.initial_storage_price);
        Self {
            trigger,
            container,
            snapshot,
            persisting_block_index,
            settings,
            limits: ExecutionEngineLimits::default(),
            gas_limit,
            fee_consumed: 0,
            exec_fee_factor: exec_fee_factor.into(),
            storage_price: storage_price.into(),
            invocation_stack: Vec::new(),
            result_stack: EvaluationStack::new(),
            entry_script_hash: None,
            notifications: Vec::new(),
            logs: Vec::new(),
            state: VMState::NONE,
            fault: None,
        }
    }

    /// Runs `script` with [`CallFlags::ALL`] under the application trigger
    /// and returns the finished engine.
    pub fn run(
        script: Vec<u8>,
        snapshot: DataCache,
        container: Option<Transaction>,
        settings: ProtocolSettings,
        gas_limit: i64,
    ) -> Self {
        let mut engine = Self::new(
            TriggerType::Application,
            container,
            snapshot,
            0,
            settings,
            gas_limit,
        );
        match engine.load_script(script, CallFlags::ALL) {
            Ok(()) => {
                engine.execute();
            }
            Err(error) => engine.on_fault(error),
        }
        engine
    }

    /// Seeds the storage of every native contract active at the persisting
    /// block. Runs once, at genesis.
    pub fn initialize_natives(&mut self) -> Result<()> {
        if self.trigger != TriggerType::OnPersist {
            return Err(Error::state(
                "native contracts are initialized by the OnPersist trigger",
            ));
        }
        for contract in native::registry().contracts() {
            if contract.is_active(&self.settings, self.persisting_block_index) {
                debug!(contract = contract.name(), "initializing native contract");
                contract.initialize(self)?;
            }
        }
        Ok(())
    }

    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    pub fn container(&self) -> Option<&Transaction> {
        self.container.as_ref()
    }

    pub fn snapshot(&self) -> &DataCache {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut DataCache {
        &mut self.snapshot
    }

    /// Consumes the engine, keeping its uncommitted snapshot.
    pub fn into_snapshot(self) -> DataCache {
        self.snapshot
    }

    pub fn persisting_block_index(&self) -> u32 {
        self.persisting_block_index
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn limits(&self) -> &ExecutionEngineLimits {
        &self.limits
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    /// Why the execution faulted, if it did.
    pub fn fault_exception(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    pub fn result_stack(&self) -> &EvaluationStack {
        &self.result_stack
    }

    pub fn is_hardfork_enabled(&self, hardfork: Hardfork) -> bool {
        self.settings
            .is_hardfork_enabled(hardfork, self.persisting_block_index)
    }

    pub fn invocation_depth(&self) -> usize {
        self.invocation_stack.len()
    }

    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    pub(crate) fn current_context_mut(&mut self) -> Result<&mut ExecutionContext> {
        self.invocation_stack
            .last_mut()
            .ok_or_else(|| Error::state("no context is executing"))
    }

    fn require_current_context(&self) -> Result<&ExecutionContext> {
        self.current_context()
            .ok_or_else(|| Error::state("no context is executing"))
    }

    /// Hash of the executing script.
    pub fn current_script_hash(&self) -> Result<UInt160> {
        Ok(self.require_current_context()?.script_hash())
    }

    /// Hash of the script that called the executing one.
    pub fn calling_script_hash(&self) -> Option<UInt160> {
        self.current_context()
            .and_then(|context| context.state.calling_script_hash)
    }

    /// Hash of the first script loaded into the engine.
    pub fn entry_script_hash(&self) -> Option<UInt160> {
        self.entry_script_hash
    }

    /// Loads `script` as a new context on top of the invocation stack.
    pub fn load_script(&mut self, script: Vec<u8>, call_flags: CallFlags) -> Result<()> {
        let state = ExecutionContextState {
            script_hash: UInt160::from_script(&script),
            call_flags,
            ..Default::default()
        };
        self.load_context(ExecutionContext::new(script.into(), 0, None, state))
    }

    pub(crate) fn load_context(&mut self, context: ExecutionContext) -> Result<()> {
        let limit = self.limits.max_invocation_stack_size as usize;
        if self.invocation_stack.len() >= limit {
            return Err(Error::from(VmError::invalid_operation(format!(
                "maximum invocation stack size {limit} reached"
            ))));
        }
        if self.entry_script_hash.is_none() {
            self.entry_script_hash = Some(context.script_hash());
        }
        trace!(
            script_hash = %context.script_hash(),
            depth = self.invocation_stack.len() + 1,
            "context loaded"
        );
        self.invocation_stack.push(context);
        Ok(())
    }

    /// Runs until the invocation stack is empty or an error faults the engine.
    pub fn execute(&mut self) -> VMState {
        if self.state != VMState::NONE {
            return self.state;
        }
        while !self.invocation_stack.is_empty() {
            if let Err(error) = self.execute_next() {
                self.on_fault(error);
                return self.state;
            }
        }
        self.state = VMState::HALT;
        self.state
    }

    fn on_fault(&mut self, error: Error) {
        warn!(%error, fee_consumed = self.fee_consumed, "execution faulted");
        self.state = VMState::FAULT;
        self.fault = Some(error);
    }

    /// Executes the instruction at the current context's instruction pointer.
    ///
    /// Running off the end of a script is an implicit `RET`.
    pub fn execute_next(&mut self) -> Result<()> {
        let depth = self.invocation_stack.len();
        let context = self.require_current_context()?;
        let script = context.shared_script();
        let position = context.instruction_pointer;
        if position >= script.len() {
            return self.execute_ret();
        }
        let instruction = Instruction::parse(&script, position)?;
        self.add_gas(op_code_price(instruction.opcode) * self.exec_fee_factor)?;
        self.execute_instruction(&instruction, position, script.len())?;
        if self.invocation_stack.len() >= depth {
            if let Some(context) = self.invocation_stack.get_mut(depth - 1) {
                context.instruction_pointer += instruction.size;
            }
        }
        Ok(())
    }

    fn execute_instruction(
        &mut self,
        instruction: &Instruction<'_>,
        position: usize,
        script_len: usize,
    ) -> Result<()> {
        let opcode = instruction.opcode;
        match opcode {
            OpCode::PUSHINT8
            | OpCode::PUSHINT16
            | OpCode::PUSHINT32
            | OpCode::PUSHINT64
            | OpCode::PUSHINT128
            | OpCode::PUSHINT256 => {
                self.push(StackItem::from(BigInt::from_signed_bytes_le(
                    instruction.operand,
                )))?;
            }
            OpCode::PUSHT => self.push(StackItem::from(true))?,
            OpCode::PUSHF => self.push(StackItem::from(false))?,
            OpCode::PUSHA => {
                let offset = i32::from_le_bytes(
                    instruction
                        .operand
                        .try_into()
                        .map_err(|_| VmError::InvalidScript("PUSHA needs a 4-byte operand".into()))?,
                );
                let target = position as i64 + i64::from(offset);
                if target < 0 || target > script_len as i64 {
                    return Err(VmError::invalid_operation(format!(
                        "pointer {target} is outside the script"
                    ))
                    .into());
                }
                self.push(StackItem::Pointer(target as usize))?;
            }
            OpCode::PUSHNULL => self.push(StackItem::Null)?,
            OpCode::PUSHDATA1 | OpCode::PUSHDATA2 | OpCode::PUSHDATA4 => {
                self.limits.assert_max_item_size(instruction.operand.len())?;
                self.push(StackItem::from(instruction.operand))?;
            }
            OpCode::PUSHM1 => self.push(StackItem::from(-1))?,
            OpCode::PUSH0
            | OpCode::PUSH1
            | OpCode::PUSH2
            | OpCode::PUSH3
            | OpCode::PUSH4
            | OpCode::PUSH5
            | OpCode::PUSH6
            | OpCode::PUSH7
            | OpCode::PUSH8
            | OpCode::PUSH9
            | OpCode::PUSH10
            | OpCode::PUSH11
            | OpCode::PUSH12
            | OpCode::PUSH13
            | OpCode::PUSH14
            | OpCode::PUSH15
            | OpCode::PUSH16 => {
                self.push(StackItem::from(opcode as u8 - OpCode::PUSH0 as u8))?;
            }
            OpCode::NOP => {}
            OpCode::ABORT => return Err(Error::state("ABORT is executed")),
            OpCode::THROW => {
                let item = self.pop()?;
                let message = item
                    .get_string()
                    .unwrap_or_else(|_| item.item_type().name().to_string());
                return Err(Error::state(format!("unhandled exception: {message}")));
            }
            OpCode::RET => self.execute_ret()?,
            OpCode::SYSCALL => self.on_syscall(instruction.token_u32()?)?,
            OpCode::DROP => {
                self.pop()?;
            }
            OpCode::DUP => {
                let item = self.peek(0)?.clone();
                self.push(item)?;
            }
            OpCode::SWAP => self.current_context_mut()?.evaluation_stack.swap_top()?,
            OpCode::PACK => {
                let size = self.pop()?.get_integer()?;
                let available = self.require_current_context()?.evaluation_stack.len();
                let size = usize::try_from(&size)
                    .ok()
                    .filter(|size| *size <= available)
                    .ok_or_else(|| {
                        VmError::invalid_operation(format!(
                            "PACK of {size} items with {available} on the stack"
                        ))
                    })?;
                let mut items = Vec::with_capacity(size);
                for _ in 0..size {
                    items.push(self.pop()?);
                }
                self.push(StackItem::new_array(items))?;
            }
        }
        Ok(())
    }

    fn execute_ret(&mut self) -> Result<()> {
        let mut context = self
            .invocation_stack
            .pop()
            .ok_or_else(|| Error::state("RET without a context"))?;
        let returned = context.evaluation_stack.len();
        if let Some(rvcount) = context.rvcount {
            if returned != rvcount {
                return Err(Error::state(format!(
                    "context returned {returned} items, expected {rvcount}"
                )));
            }
        }
        if let Some(awaiter) = context.state.awaiter.take() {
            awaiter.set_result(context.evaluation_stack.pop().ok());
            return Ok(());
        }
        if context.state.is_dynamic_call && returned > 1 {
            return Err(Error::not_supported(
                "multiple return values are not allowed in cross-contract calls",
            ));
        }
        match self.invocation_stack.last_mut() {
            Some(caller) => {
                context
                    .evaluation_stack
                    .move_to(&mut caller.evaluation_stack);
                if context.state.is_dynamic_call && returned == 0 {
                    caller.evaluation_stack.push(StackItem::Null);
                }
            }
            None => context.evaluation_stack.move_to(&mut self.result_stack),
        }
        trace!(script_hash = %context.script_hash(), "context unloaded");
        Ok(())
    }

    /// Dispatches a `SYSCALL`: checks flags, charges the fixed price, pops
    /// and converts the declared parameters, then runs the handler.
    fn on_syscall(&mut self, hash: u32) -> Result<()> {
        let descriptor = interop::services()
            .get(hash)
            .ok_or_else(|| Error::not_supported(format!("unknown syscall {hash:#010x}")))?;
        self.validate_call_flags(descriptor.required_call_flags)?;
        self.add_gas(descriptor.fixed_price * self.exec_fee_factor)?;
        let mut args = Vec::with_capacity(descriptor.parameters.len());
        for parameter in &descriptor.parameters {
            let item = self.pop()?;
            args.push(parameter.convert(&item)?);
        }
        trace!(service = descriptor.name, "syscall");
        let result = (descriptor.handler)(self, Arguments::new(args))?;
        if !matches!(result, InteropValue::Void) {
            let item = result.into_stack_item()?;
            self.push(item)?;
        }
        Ok(())
    }

    /// Fails unless the executing context holds every flag in `required`.
    pub fn validate_call_flags(&self, required: CallFlags) -> Result<()> {
        let granted = self.require_current_context()?.call_flags();
        if !granted.has_flag(required) {
            return Err(Error::permission(format!(
                "cannot call this method with the flag {granted:?}, {required:?} is required"
            )));
        }
        Ok(())
    }

    /// Pushes onto the executing context's evaluation stack.
    pub fn push(&mut self, item: StackItem) -> Result<()> {
        let limit = self.limits.max_stack_size as usize;
        let context = self.current_context_mut()?;
        if context.evaluation_stack.len() >= limit {
            return Err(VmError::StackOverflow(limit).into());
        }
        context.evaluation_stack.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<StackItem> {
        Ok(self.current_context_mut()?.evaluation_stack.pop()?)
    }

    pub fn peek(&self, n: usize) -> Result<&StackItem> {
        Ok(self.require_current_context()?.evaluation_stack.peek(n)?)
    }

    /// Writes the snapshot through to its store. Only a halted execution
    /// may commit.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != VMState::HALT {
            return Err(Error::state(format!(
                "cannot commit an execution in state {:?}",
                self.state
            )));
        }
        self.snapshot.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_persistence::MemoryStore;
    use neo_vm::ScriptBuilder;
    use std::sync::Arc;

    fn run(script: Vec<u8>, gas: i64) -> ApplicationEngine {
        let snapshot = DataCache::new(Arc::new(MemoryStore::new()));
        ApplicationEngine::run(script, snapshot, None, ProtocolSettings::default(), gas)
    }

    #[test]
    fn test_push_and_pack() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_int(300).unwrap();
        sb.emit_push_bytes(b"neo");
        sb.emit(OpCode::PUSH2).emit(OpCode::PACK);
        let engine = run(sb.to_array(), 1_0000_0000);
        assert_eq!(engine.state(), VMState::HALT);
        let result = engine.result_stack().peek(0).unwrap().clone();
        let StackItem::Array(array) = result else {
            panic!("expected an array");
        };
        assert_eq!(array.get(0).unwrap().get_span().unwrap(), b"neo".to_vec());
        assert_eq!(array.get(1).unwrap().get_integer().unwrap(), BigInt::from(300));
    }

    #[test]
    fn test_stack_ops() {
        let script = vec![
            OpCode::PUSH1 as u8,
            OpCode::PUSH2 as u8,
            OpCode::SWAP as u8,
            OpCode::DUP as u8,
            OpCode::DROP as u8,
            OpCode::NOP as u8,
        ];
        let engine = run(script, 1_0000_0000);
        assert_eq!(engine.state(), VMState::HALT);
        let results: Vec<_> = engine.result_stack().iter().cloned().collect();
        assert_eq!(results, vec![StackItem::from(2), StackItem::from(1)]);
    }

    #[test]
    fn test_opcode_fees_use_exec_fee_factor() {
        let engine = run(vec![OpCode::PUSH1 as u8, OpCode::RET as u8], 1_0000_0000);
        assert_eq!(engine.fee_consumed(), 30);
    }

    #[test]
    fn test_out_of_gas_faults() {
        let engine = run(vec![OpCode::PUSH1 as u8; 10], 100);
        assert_eq!(engine.state(), VMState::FAULT);
        assert!(engine.fault_exception().unwrap().is_fatal_to_transaction());
    }

    #[test]
    fn test_abort_and_throw_fault() {
        assert!(run(vec![OpCode::ABORT as u8], 1_0000_0000).state().is_fault());
        let engine = run(vec![OpCode::PUSH0 as u8, OpCode::THROW as u8], 1_0000_0000);
        assert!(engine.state().is_fault());
        assert!(run(vec![0xFF], 1_0000_0000).state().is_fault());
    }

    #[test]
    fn test_unknown_syscall_faults() {
        let mut sb = ScriptBuilder::new();
        sb.emit_syscall(0xDEADBEEF);
        let engine = run(sb.to_array(), 1_0000_0000);
        assert!(matches!(
            engine.fault_exception(),
            Some(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_commit_requires_halt() {
        let mut engine = run(vec![OpCode::ABORT as u8], 1_0000_0000);
        assert!(engine.commit().is_err());
        let mut engine = run(vec![OpCode::PUSH1 as u8], 1_0000_0000);
        assert!(engine.commit().is_ok());
    }

    #[test]
    fn test_transaction_sender() {
        let tx = Transaction::new(vec![UInt160::from([1u8; 20]), UInt160::from([2u8; 20])]);
        assert_eq!(tx.sender(), Some(UInt160::from([1u8; 20])));
        assert_eq!(Transaction::default().sender(), None);
    }
}
