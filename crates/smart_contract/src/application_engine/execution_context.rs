//! Execution contexts on the engine's invocation stack.

use crate::contract_state::ContractState;
use crate::contract_task::ContractTaskAwaiter;
use neo_core::UInt160;
use neo_vm::{CallFlags, EvaluationStack};
use std::rc::Rc;

/// Per-context state the contract runtime attaches to a loaded script.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContextState {
    /// Hash of the executing script.
    pub script_hash: UInt160,

    /// Hash of the script that loaded this context, if any.
    pub calling_script_hash: Option<UInt160>,

    /// Capabilities granted to this context.
    pub call_flags: CallFlags,

    /// The deployed or native contract being executed, if any.
    pub contract: Option<ContractState>,

    /// Loaded by `System.Contract.Call`. Such a context returns exactly one
    /// value to its caller.
    pub is_dynamic_call: bool,

    /// Completed with the context's result when it returns.
    pub(crate) awaiter: Option<ContractTaskAwaiter>,
}

/// A script being executed, with its own evaluation stack.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    script: Rc<[u8]>,
    pub instruction_pointer: usize,
    pub evaluation_stack: EvaluationStack,
    /// The number of items the context must leave on its stack when it
    /// returns; `None` when unchecked.
    pub rvcount: Option<usize>,
    pub state: ExecutionContextState,
}

impl ExecutionContext {
    pub fn new(
        script: Rc<[u8]>,
        instruction_pointer: usize,
        rvcount: Option<usize>,
        state: ExecutionContextState,
    ) -> Self {
        Self {
            script,
            instruction_pointer,
            evaluation_stack: EvaluationStack::new(),
            rvcount,
            state,
        }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub(crate) fn shared_script(&self) -> Rc<[u8]> {
        Rc::clone(&self.script)
    }

    pub fn script_hash(&self) -> UInt160 {
        self.state.script_hash
    }

    pub fn call_flags(&self) -> CallFlags {
        self.state.call_flags
    }
}
