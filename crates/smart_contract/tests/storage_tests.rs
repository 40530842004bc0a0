//! Storage services through the engine: billing, read-only contexts and
//! search options.

mod common;

use common::*;
use neo_core::UInt160;
use neo_persistence::MemoryStore;
use neo_smart_contract::{ApplicationEngine, Error};
use neo_vm::{StackItem, VMState};
use std::sync::Arc;

/// Gas consumed by `put(value)` over the current state of `store`.
fn put_fee(store: &Arc<MemoryStore>, hash: &UInt160, value_len: usize) -> i64 {
    let engine = run(
        store,
        &settings(),
        vec![sender()],
        call_script(hash, "put", &[StackItem::from(vec![0xAB; value_len])]),
    );
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_exception());
    engine.fee_consumed()
}

#[test]
fn test_put_is_billed_per_byte() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    let price = i64::from(settings.initial_storage_price);

    // A new entry pays for its key and value.
    assert_eq!(put_fee(&store, &hash, 6) - put_fee(&store, &hash, 2), 4 * price);
    let fresh_two = put_fee(&store, &hash, 2);

    run_and_commit(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from(vec![0xAB; 10])]),
    );

    // Rewriting 10 bytes: 2 units when shrinking to 6, 3 at the same size,
    // 3 plus the 4 new bytes when growing to 14.
    let shrink = put_fee(&store, &hash, 6);
    let same = put_fee(&store, &hash, 10);
    let grow = put_fee(&store, &hash, 14);
    assert_eq!(same - shrink, price);
    assert_eq!(grow - same, 4 * price);
    // A fresh 2-byte value pays 3 units, an overwrite with it pays 1.
    assert_eq!(fresh_two - put_fee(&store, &hash, 2), 2 * price);
}

#[test]
fn test_read_only_context_rejects_put() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    let engine = run(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "putReadOnly", &[StackItem::from("v")]),
    );
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::Permission(_))));
}

#[test]
fn test_oversized_value_is_rejected() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    let engine = run(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from(vec![0u8; 65536])]),
    );
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn test_get_of_missing_key_is_null() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    let engine = run(&store, &settings, vec![], call_script(&hash, "get", &[]));
    assert_eq!(engine.state(), VMState::HALT);
    assert!(engine.result_stack().peek(0).unwrap().is_null());
}

#[test]
fn test_storage_context_needs_a_contract() {
    let settings = settings();
    let store = genesis(&settings);
    let mut sb = neo_vm::ScriptBuilder::new();
    sb.emit_syscall(neo_smart_contract::interop::selector(
        neo_smart_contract::interop::SYSTEM_STORAGE_GET_CONTEXT,
    ));
    let engine = run(&store, &settings, vec![], sb.to_array());
    assert_eq!(engine.state(), VMState::FAULT);
}

/// Runs `method` of a freshly deployed store contract holding `v` under `k`.
fn call_with_value_stored(method: &str, args: &[StackItem]) -> ApplicationEngine {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    run_and_commit(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from("v")]),
    );
    run(&store, &settings, vec![sender()], call_script(&hash, method, args))
}

#[test]
fn test_read_only_contexts_reject_writes() {
    for (method, args) in [
        ("deleteReadOnly", vec![]),
        ("putViaReadOnlyContext", vec![StackItem::from("w")]),
        ("deleteViaReadOnlyContext", vec![]),
    ] {
        let engine = call_with_value_stored(method, &args);
        assert_eq!(engine.state(), VMState::FAULT, "{method}");
        assert!(
            matches!(engine.fault_exception(), Some(Error::Permission(_))),
            "{method}: {:?}",
            engine.fault_exception()
        );
    }
}

#[test]
fn test_delete_removes_value() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    run_and_commit(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from("v")]),
    );
    run_and_commit(&store, &settings, vec![sender()], call_script(&hash, "delete", &[]));
    let engine = run(&store, &settings, vec![], call_script(&hash, "get", &[]));
    assert!(engine.result_stack().peek(0).unwrap().is_null());
}

#[test]
fn test_delete_of_missing_key_succeeds() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));
    let engine = run(&store, &settings, vec![sender()], call_script(&hash, "delete", &[]));
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_exception());
}

#[test]
fn test_find_accepts_valid_options() {
    let engine = call_with_value_stored("find", &[StackItem::from(1)]);
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_exception());
    assert!(engine.result_stack().peek(0).unwrap().get_boolean().unwrap());
}

#[test]
fn test_find_rejects_conflicting_options() {
    // KeysOnly with ValuesOnly, then PickField0 without DeserializeValues.
    for options in [1 | 4, 16] {
        let engine = call_with_value_stored("find", &[StackItem::from(options)]);
        assert_eq!(engine.state(), VMState::FAULT, "options {options}");
        assert!(
            matches!(engine.fault_exception(), Some(Error::Argument(_))),
            "options {options}: {:?}",
            engine.fault_exception()
        );
    }
}
