//! Shared fixtures: a genesis store, a sample contract and script helpers.

#![allow(dead_code)]

use neo_config::ProtocolSettings;
use neo_core::UInt160;
use neo_io::SerializableExt;
use neo_persistence::MemoryStore;
use neo_smart_contract::helper::emit_dynamic_call;
use neo_smart_contract::interop::{self, selector};
use neo_smart_contract::manifest::{
    ContractAbi, ContractManifest, ContractMethodDescriptor, ContractParameterDefinition,
    ContractParameterType,
};
use neo_smart_contract::native::{self, NativeContract};
use neo_smart_contract::{ApplicationEngine, DataCache, NefFile, Transaction, TriggerType};
use neo_vm::{CallFlags, OpCode, ScriptBuilder, StackItem, VMState};
use std::sync::Arc;

pub const GAS_LIMIT: i64 = 20_0000_0000;

pub fn sender() -> UInt160 {
    UInt160::from([0x11; 20])
}

pub fn committee() -> UInt160 {
    UInt160::from([0xCC; 20])
}

pub fn settings() -> ProtocolSettings {
    ProtocolSettings {
        committee: Some(committee().to_string()),
        ..ProtocolSettings::default()
    }
}

/// Sends engine logs to the test output. Set `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A store holding the genesis state of every native contract.
pub fn genesis(settings: &ProtocolSettings) -> Arc<MemoryStore> {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let mut engine = ApplicationEngine::new(
        TriggerType::OnPersist,
        None,
        DataCache::new(store.clone()),
        0,
        settings.clone(),
        0,
    );
    engine.initialize_natives().unwrap();
    engine.into_snapshot().commit().unwrap();
    store
}

/// Runs `script` signed by `signers` over a fresh snapshot of `store`.
pub fn run(
    store: &Arc<MemoryStore>,
    settings: &ProtocolSettings,
    signers: Vec<UInt160>,
    script: Vec<u8>,
) -> ApplicationEngine {
    ApplicationEngine::run(
        script,
        DataCache::new(store.clone()),
        Some(Transaction::new(signers)),
        settings.clone(),
        GAS_LIMIT,
    )
}

/// Runs `script` and commits its changes, which must succeed.
pub fn run_and_commit(
    store: &Arc<MemoryStore>,
    settings: &ProtocolSettings,
    signers: Vec<UInt160>,
    script: Vec<u8>,
) -> ApplicationEngine {
    let mut engine = run(store, settings, signers, script);
    assert_eq!(
        engine.state(),
        VMState::HALT,
        "fault: {:?}",
        engine.fault_exception()
    );
    engine.commit().unwrap();
    engine
}

pub fn call_script(hash: &UInt160, method: &str, args: &[StackItem]) -> Vec<u8> {
    let mut sb = ScriptBuilder::new();
    emit_dynamic_call(&mut sb, hash, method, CallFlags::ALL, args).unwrap();
    sb.to_array()
}

fn method(
    name: &str,
    parameters: Vec<ContractParameterDefinition>,
    return_type: ContractParameterType,
    offset: usize,
) -> ContractMethodDescriptor {
    ContractMethodDescriptor {
        name: name.to_string(),
        parameters,
        return_type,
        offset: offset as i32,
        safe: false,
    }
}

/// A contract that keeps one value under the key `k`.
///
/// * `put(value)` stores `value`
/// * `get()` returns the stored value
/// * `first()` returns the first value found under `k` through an iterator
/// * `putReadOnly(value)` tries to store `value` through a read-only context
/// * `destroy()` destroys the contract through contract management
/// * `delete()` removes the value
/// * `deleteReadOnly()` tries to remove it through `AsReadOnly`
/// * `putViaReadOnlyContext(value)` tries to store through `GetReadOnlyContext`
/// * `deleteViaReadOnlyContext()` tries to remove through `GetReadOnlyContext`
/// * `find(options)` searches under `k` with raw `options`, returning whether
///   an entry was found
pub fn store_contract(name: &str) -> (NefFile, ContractManifest) {
    let mut sb = ScriptBuilder::new();
    let get_context = selector(interop::SYSTEM_STORAGE_GET_CONTEXT);

    let put = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_PUT))
        .emit(OpCode::RET);

    let get = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_GET))
        .emit(OpCode::RET);

    let first = sb.len();
    sb.emit(OpCode::PUSH4)
        .emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_FIND))
        .emit(OpCode::DUP)
        .emit_syscall(selector(interop::SYSTEM_ITERATOR_NEXT))
        .emit(OpCode::DROP)
        .emit_syscall(selector(interop::SYSTEM_ITERATOR_VALUE))
        .emit(OpCode::RET);

    let put_read_only = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_AS_READ_ONLY))
        .emit_syscall(selector(interop::SYSTEM_STORAGE_PUT))
        .emit(OpCode::RET);

    let destroy = sb.len();
    emit_dynamic_call(
        &mut sb,
        &native::contract_management().hash(),
        "destroy",
        CallFlags::ALL,
        &[],
    )
    .unwrap();
    sb.emit(OpCode::DROP).emit(OpCode::RET);

    let delete = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_DELETE))
        .emit(OpCode::RET);

    let delete_read_only = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_AS_READ_ONLY))
        .emit_syscall(selector(interop::SYSTEM_STORAGE_DELETE))
        .emit(OpCode::RET);

    let get_read_only_context = selector(interop::SYSTEM_STORAGE_GET_READ_ONLY_CONTEXT);
    let put_via_read_only_context = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_read_only_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_PUT))
        .emit(OpCode::RET);

    let delete_via_read_only_context = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_read_only_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_DELETE))
        .emit(OpCode::RET);

    let find = sb.len();
    sb.emit_push_bytes(b"k")
        .emit_syscall(get_context)
        .emit_syscall(selector(interop::SYSTEM_STORAGE_FIND))
        .emit_syscall(selector(interop::SYSTEM_ITERATOR_NEXT))
        .emit(OpCode::RET);

    let value_param = || {
        vec![ContractParameterDefinition::new(
            "value",
            ContractParameterType::ByteArray,
        )]
    };
    let abi = ContractAbi {
        methods: vec![
            method("put", value_param(), ContractParameterType::Void, put),
            method("get", vec![], ContractParameterType::ByteArray, get),
            method("first", vec![], ContractParameterType::ByteArray, first),
            method(
                "putReadOnly",
                value_param(),
                ContractParameterType::Void,
                put_read_only,
            ),
            method("destroy", vec![], ContractParameterType::Void, destroy),
            method("delete", vec![], ContractParameterType::Void, delete),
            method(
                "deleteReadOnly",
                vec![],
                ContractParameterType::Void,
                delete_read_only,
            ),
            method(
                "putViaReadOnlyContext",
                value_param(),
                ContractParameterType::Void,
                put_via_read_only_context,
            ),
            method(
                "deleteViaReadOnlyContext",
                vec![],
                ContractParameterType::Void,
                delete_via_read_only_context,
            ),
            method(
                "find",
                vec![ContractParameterDefinition::new(
                    "options",
                    ContractParameterType::Integer,
                )],
                ContractParameterType::Boolean,
                find,
            ),
        ],
        events: vec![],
    };
    let nef = NefFile::new("neo-test", "", Vec::new(), sb.into_script()).unwrap();
    (nef, ContractManifest::new(name, abi))
}

/// Deploys `contract` from [`sender`] and returns its hash.
pub fn deploy(
    store: &Arc<MemoryStore>,
    settings: &ProtocolSettings,
    contract: &(NefFile, ContractManifest),
) -> UInt160 {
    let (nef, manifest) = contract;
    let script = call_script(
        &native::contract_management().hash(),
        "deploy",
        &[
            StackItem::from(nef.to_array().unwrap()),
            StackItem::from(manifest.to_json_bytes().unwrap()),
        ],
    );
    let engine = run_and_commit(store, settings, vec![sender()], script);
    let StackItem::Array(state) = engine.result_stack().peek(0).unwrap().clone() else {
        panic!("deploy returns the contract state");
    };
    UInt160::from_bytes(&state.get(2).unwrap().get_span().unwrap()).unwrap()
}
