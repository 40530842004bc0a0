//! `System.Runtime.*` services seen from an entry script.

mod common;

use common::*;
use neo_core::UInt160;
use neo_smart_contract::interop::{self, selector};
use neo_smart_contract::{Error, TriggerType};
use neo_vm::{CallFlags, OpCode, ScriptBuilder, StackItem, VMState};
use num_bigint::BigInt;

#[test]
fn test_runtime_queries_and_log() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = ScriptBuilder::new();
    sb.emit_push_bytes(b"hello")
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_LOG))
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_GET_EXECUTING_SCRIPT_HASH))
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_GET_CALLING_SCRIPT_HASH))
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_GET_TRIGGER))
        .emit_syscall(selector(interop::SYSTEM_CONTRACT_GET_CALL_FLAGS));
    let script = sb.to_array();

    let engine = run(&store, &settings, vec![sender()], script.clone());
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_exception());

    let results: Vec<StackItem> = engine.result_stack().iter().cloned().collect();
    assert_eq!(results.len(), 4);
    let entry_hash = UInt160::from_script(&script);
    assert_eq!(results[0].get_span().unwrap(), entry_hash.to_array().to_vec());
    assert!(results[1].is_null());
    assert_eq!(
        results[2].get_integer().unwrap(),
        BigInt::from(TriggerType::Application as u8)
    );
    assert_eq!(results[3].get_integer().unwrap(), BigInt::from(CallFlags::ALL.bits()));

    assert_eq!(engine.logs().len(), 1);
    assert_eq!(engine.logs()[0].message, "hello");
    assert_eq!(engine.logs()[0].script_hash, entry_hash);
}

#[test]
fn test_log_rejects_invalid_utf8() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = ScriptBuilder::new();
    sb.emit_push_bytes(&[0xff, 0xfe])
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_LOG));

    let engine = run(&store, &settings, vec![], sb.to_array());
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::Argument(_))));
    assert!(engine.logs().is_empty());
}

#[test]
fn test_entry_script_cannot_notify() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = ScriptBuilder::new();
    sb.emit(OpCode::PUSH0)
        .emit(OpCode::PACK)
        .emit_push_bytes(b"Transfer")
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_NOTIFY));

    let engine = run(&store, &settings, vec![], sb.to_array());
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::State(_))));
    assert!(engine.notifications().is_empty());
}

#[test]
fn test_long_event_name_is_rejected() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = ScriptBuilder::new();
    sb.emit(OpCode::PUSH0)
        .emit(OpCode::PACK)
        .emit_push_bytes(&[b'e'; 33])
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_NOTIFY));

    let engine = run(&store, &settings, vec![], sb.to_array());
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::Argument(_))));
}

#[test]
fn test_syscall_without_required_flags_faults() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = ScriptBuilder::new();
    sb.emit_push_bytes(b"quiet")
        .emit_syscall(selector(interop::SYSTEM_RUNTIME_LOG));

    let mut engine = neo_smart_contract::ApplicationEngine::new(
        TriggerType::Application,
        None,
        neo_smart_contract::DataCache::new(store.clone()),
        0,
        settings.clone(),
        GAS_LIMIT,
    );
    engine.load_script(sb.to_array(), CallFlags::READ_ONLY).unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::Permission(_))));
}
