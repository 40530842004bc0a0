//! Base native contract trait and types.

use super::contract_method_metadata::{CallContext, ContractMethodMetadata};
use crate::application_engine::ApplicationEngine;
use crate::contract_state::ContractState;
use crate::contract_task::ContractTask;
use crate::data_cache::DataCache;
use crate::helper::get_contract_hash;
use crate::interop::{self, Arguments, InteropParameterType};
use crate::manifest::{ContractAbi, ContractEventDescriptor, ContractManifest};
use crate::nef_file::NefFile;
use crate::{Error, Result};
use neo_config::{Hardfork, ProtocolSettings};
use neo_core::UInt160;
use neo_vm::{OpCode, ScriptBuilder};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Compiler recorded in the NEF of every native contract.
pub const NATIVE_COMPILER: &str = "neo-core-v3.0";

/// What a native method handler runs against.
pub enum NativeCallContext<'a> {
    None,
    Snapshot(&'a mut DataCache),
    Engine(&'a mut ApplicationEngine),
}

impl<'a> NativeCallContext<'a> {
    pub fn engine(self) -> Result<&'a mut ApplicationEngine> {
        match self {
            NativeCallContext::Engine(engine) => Ok(engine),
            _ => Err(Error::state("the method was not declared with the engine")),
        }
    }

    pub fn snapshot(self) -> Result<&'a mut DataCache> {
        match self {
            NativeCallContext::Snapshot(snapshot) => Ok(snapshot),
            NativeCallContext::Engine(engine) => Ok(engine.snapshot_mut()),
            NativeCallContext::None => {
                Err(Error::state("the method was not declared with the snapshot"))
            }
        }
    }
}

/// Trait for native contract implementations.
pub trait NativeContract: Send + Sync {
    fn base(&self) -> &NativeContractBase;

    fn name(&self) -> &'static str {
        self.base().name()
    }

    fn hash(&self) -> UInt160 {
        self.base().hash()
    }

    fn id(&self) -> i32 {
        self.base().id()
    }

    /// Runs `method` with its converted arguments.
    ///
    /// Overloads share a name; handlers tell them apart by `args.len()`.
    fn invoke(
        &self,
        context: NativeCallContext<'_>,
        method: &str,
        args: Arguments,
    ) -> Result<ContractTask>;

    /// Seeds the contract's storage at genesis.
    fn initialize(&self, _engine: &mut ApplicationEngine) -> Result<()> {
        Ok(())
    }

    /// The hardfork that activates the contract, if any.
    fn active_in(&self) -> Option<Hardfork> {
        None
    }

    fn is_active(&self, settings: &ProtocolSettings, height: u32) -> bool {
        self.active_in()
            .map_or(true, |hardfork| settings.is_hardfork_enabled(hardfork, height))
    }

    fn contract_state(&self) -> ContractState {
        self.base().contract_state()
    }
}

/// The parts every native contract shares: identity, sorted method table
/// and the synthetic script that routes calls back to the host.
#[derive(Debug)]
pub struct NativeContractBase {
    id: i32,
    name: &'static str,
    hash: UInt160,
    methods: Vec<ContractMethodMetadata>,
    methods_by_offset: HashMap<usize, usize>,
    nef: NefFile,
    manifest: ContractManifest,
}

impl NativeContractBase {
    /// Sorts `methods` by name and then parameter count and emits, for each
    /// one, `PUSH0; SYSCALL System.Contract.CallNative; RET`. The offset of
    /// each `SYSCALL` identifies the method at call time.
    pub fn new(
        id: i32,
        name: &'static str,
        mut methods: Vec<ContractMethodMetadata>,
        events: Vec<ContractEventDescriptor>,
    ) -> Result<Self> {
        methods.sort_by(|a, b| {
            a.name
                .cmp(b.name)
                .then(a.parameters.len().cmp(&b.parameters.len()))
        });
        let call_native = interop::selector(interop::SYSTEM_CONTRACT_CALL_NATIVE);
        let mut sb = ScriptBuilder::new();
        let mut methods_by_offset = HashMap::with_capacity(methods.len());
        let mut descriptors = Vec::with_capacity(methods.len());
        for (index, method) in methods.iter().enumerate() {
            descriptors.push(method.descriptor(sb.len()));
            sb.emit(OpCode::PUSH0);
            methods_by_offset.insert(sb.len(), index);
            sb.emit_syscall(call_native);
            sb.emit(OpCode::RET);
        }
        let nef = NefFile::new(NATIVE_COMPILER, "", Vec::new(), sb.into_script())?;
        let abi = ContractAbi {
            methods: descriptors,
            events,
        };
        let manifest = ContractManifest::new(name, abi);
        let hash = get_contract_hash(&UInt160::zero(), 0, name);
        debug!(name, id, %hash, methods = methods.len(), "native contract built");
        Ok(Self {
            id,
            name,
            hash,
            methods,
            methods_by_offset,
            nef,
            manifest,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn hash(&self) -> UInt160 {
        self.hash
    }

    /// Methods in dispatch order.
    pub fn methods(&self) -> &[ContractMethodMetadata] {
        &self.methods
    }

    /// The method whose `SYSCALL` sits at `offset` in the script.
    pub fn method_at(&self, offset: usize) -> Option<&ContractMethodMetadata> {
        self.methods_by_offset
            .get(&offset)
            .and_then(|index| self.methods.get(*index))
    }

    pub fn script(&self) -> &[u8] {
        &self.nef.script
    }

    pub fn nef(&self) -> &NefFile {
        &self.nef
    }

    pub fn manifest(&self) -> &ContractManifest {
        &self.manifest
    }

    /// The contract's state as contract management reports it. Native
    /// states are never stored.
    pub fn contract_state(&self) -> ContractState {
        ContractState::new(self.id, self.hash, self.nef.clone(), self.manifest.clone())
    }
}

/// Runs the native method the executing context points at.
///
/// Reached from `System.Contract.CallNative` inside a native contract's
/// script. Charges the method's fees, converts the arguments in place,
/// runs the handler to completion, then drops the arguments and pushes
/// the result.
pub(crate) fn invoke(engine: &mut ApplicationEngine, version: u8) -> Result<()> {
    let hash = engine.current_script_hash()?;
    let contract = super::registry()
        .get(&hash)
        .ok_or_else(|| Error::state(format!("{hash} is not a native contract")))?;
    if !contract.is_active(engine.settings(), engine.persisting_block_index()) {
        return Err(Error::state(format!(
            "the native contract {} is not active",
            contract.name()
        )));
    }
    if version != 0 {
        return Err(Error::not_supported(format!(
            "the native contract of version {version} is not active"
        )));
    }
    let (position, granted) = engine
        .current_context()
        .map(|context| (context.instruction_pointer, context.call_flags()))
        .ok_or_else(|| Error::state("no context is executing"))?;
    let method = contract.base().method_at(position).ok_or_else(|| {
        Error::state(format!(
            "no method of {} at offset {position}",
            contract.name()
        ))
    })?;
    if let Some(hardfork) = method.active_in {
        if !engine.is_hardfork_enabled(hardfork) {
            return Err(Error::state(format!(
                "method {} of {} is not active before {hardfork:?}",
                method.name,
                contract.name()
            )));
        }
    }
    if !granted.has_flag(method.required_call_flags) {
        return Err(Error::permission(format!(
            "cannot call method {} of {} with the flag {granted:?}, {:?} is required",
            method.name,
            contract.name(),
            method.required_call_flags
        )));
    }
    engine.add_gas(
        method.cpu_fee * engine.exec_fee_factor() + method.storage_fee * engine.storage_price(),
    )?;
    let mut values = Vec::with_capacity(method.parameters.len());
    for (i, parameter) in method.parameters.iter().enumerate() {
        values.push(parameter.convert(engine.peek(i)?)?);
    }
    trace!(contract = contract.name(), method = method.name, "native call");
    let context = match method.call_context {
        CallContext::None => NativeCallContext::None,
        CallContext::Snapshot => NativeCallContext::Snapshot(engine.snapshot_mut()),
        CallContext::Engine => NativeCallContext::Engine(engine),
    };
    let task = contract.invoke(context, method.name, Arguments::new(values))?;
    let result = task.wait(engine)?;
    engine
        .current_context_mut()?
        .evaluation_stack
        .drop_items(method.parameters.len())?;
    if method.return_type != InteropParameterType::Void {
        engine.push(result.into_stack_item()?)?;
    }
    Ok(())
}
