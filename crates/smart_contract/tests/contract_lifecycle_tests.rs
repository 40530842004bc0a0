//! Deploying, calling, updating and destroying contracts through the engine.

mod common;

use common::*;
use neo_io::SerializableExt;
use neo_smart_contract::native::{self, NativeContract};
use neo_smart_contract::{DataCache, Error};
use neo_vm::{StackItem, VMState};

#[test]
fn test_deploy_then_call() {
    let settings = settings();
    let store = genesis(&settings);
    let hash = deploy(&store, &settings, &store_contract("Store"));

    let snapshot = DataCache::new(store.clone());
    let state = native::contract_management()
        .get_contract(&snapshot, &hash)
        .unwrap()
        .expect("deployed contract is stored");
    assert_eq!(state.id, 1);
    assert_eq!(state.update_counter, 0);
    assert_eq!(state.manifest.name, "Store");
    assert_eq!(
        native::contract_management()
            .get_contract_by_id(&snapshot, 1)
            .unwrap()
            .map(|c| c.hash),
        Some(hash)
    );
    assert!(native::contract_management()
        .has_method(&snapshot, &hash, "put", 1)
        .unwrap());
    assert!(!native::contract_management()
        .has_method(&snapshot, &hash, "put", 2)
        .unwrap());

    run_and_commit(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from("hello")]),
    );
    let engine = run(&store, &settings, vec![], call_script(&hash, "get", &[]));
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(
        engine.result_stack().peek(0).unwrap().get_span().unwrap(),
        b"hello".to_vec()
    );

    let engine = run(&store, &settings, vec![], call_script(&hash, "first", &[]));
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_exception());
    assert_eq!(
        engine.result_stack().peek(0).unwrap().get_span().unwrap(),
        b"hello".to_vec()
    );
}

#[test]
fn test_deploy_notifies_and_ids_increase() {
    let settings = settings();
    let store = genesis(&settings);
    let (nef, manifest) = store_contract("First");
    let script = call_script(
        &native::contract_management().hash(),
        "deploy",
        &[
            StackItem::from(nef.to_array().unwrap()),
            StackItem::from(manifest.to_json_bytes().unwrap()),
        ],
    );
    let engine = run_and_commit(&store, &settings, vec![sender()], script);
    let deploys: Vec<_> = engine
        .notifications()
        .iter()
        .filter(|n| n.event_name == "Deploy")
        .collect();
    assert_eq!(deploys.len(), 1);
    assert_eq!(deploys[0].script_hash, native::contract_management().hash());
    assert!(engine.fee_consumed() >= settings.minimum_deployment_fee);

    let second = deploy(&store, &settings, &store_contract("Second"));
    let snapshot = DataCache::new(store.clone());
    let state = native::contract_management()
        .get_contract(&snapshot, &second)
        .unwrap()
        .unwrap();
    assert_eq!(state.id, 2);
}

#[test]
fn test_deploy_twice_faults() {
    let settings = settings();
    let store = genesis(&settings);
    let contract = store_contract("Store");
    deploy(&store, &settings, &contract);
    let (nef, manifest) = &contract;
    let script = call_script(
        &native::contract_management().hash(),
        "deploy",
        &[
            StackItem::from(nef.to_array().unwrap()),
            StackItem::from(manifest.to_json_bytes().unwrap()),
        ],
    );
    let engine = run(&store, &settings, vec![sender()], script);
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(matches!(engine.fault_exception(), Some(Error::State(_))));
}

#[test]
fn test_deploy_needs_a_transaction() {
    let settings = settings();
    let store = genesis(&settings);
    let (nef, manifest) = store_contract("Store");
    let script = call_script(
        &native::contract_management().hash(),
        "deploy",
        &[
            StackItem::from(nef.to_array().unwrap()),
            StackItem::from(manifest.to_json_bytes().unwrap()),
        ],
    );
    let engine = neo_smart_contract::ApplicationEngine::run(
        script,
        DataCache::new(store.clone()),
        None,
        settings.clone(),
        GAS_LIMIT,
    );
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn test_destroy_removes_storage_and_blocks_hash() {
    let settings = settings();
    let store = genesis(&settings);
    let contract = store_contract("Store");
    let hash = deploy(&store, &settings, &contract);
    run_and_commit(
        &store,
        &settings,
        vec![sender()],
        call_script(&hash, "put", &[StackItem::from("value")]),
    );

    let engine = run_and_commit(&store, &settings, vec![sender()], call_script(&hash, "destroy", &[]));
    assert!(engine
        .notifications()
        .iter()
        .any(|n| n.event_name == "Destroy"));

    let snapshot = DataCache::new(store.clone());
    assert!(native::contract_management()
        .get_contract(&snapshot, &hash)
        .unwrap()
        .is_none());
    assert!(native::contract_management()
        .get_contract_by_id(&snapshot, 1)
        .unwrap()
        .is_none());
    assert!(native::policy().is_blocked(&snapshot, &hash).unwrap());
    let mut leftover = snapshot.find(
        &neo_smart_contract::storage::StorageKey::create_search_prefix(1, &[]),
        neo_persistence::SeekDirection::Forward,
    );
    assert!(leftover.next().is_none());

    // The same contract can't come back at the blocked hash.
    let (nef, manifest) = &contract;
    let script = call_script(
        &native::contract_management().hash(),
        "deploy",
        &[
            StackItem::from(nef.to_array().unwrap()),
            StackItem::from(manifest.to_json_bytes().unwrap()),
        ],
    );
    assert_eq!(run(&store, &settings, vec![sender()], script).state(), VMState::FAULT);
}

#[test]
fn test_calling_a_missing_contract_faults() {
    let settings = settings();
    let store = genesis(&settings);
    let missing = neo_core::UInt160::from([0x42; 20]);
    let engine = run(&store, &settings, vec![], call_script(&missing, "get", &[]));
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn test_contract_hashes_iterate_deployed_contracts() {
    let settings = settings();
    let store = genesis(&settings);
    let first = deploy(&store, &settings, &store_contract("A"));
    let second = deploy(&store, &settings, &store_contract("B"));
    let snapshot = DataCache::new(store.clone());
    let iterator = native::contract_management().get_contract_hashes(Default::default());
    let mut hashes = Vec::new();
    while iterator.next(&snapshot) {
        let StackItem::Struct(entry) = iterator.value().unwrap() else {
            panic!("entries are key/value structs");
        };
        assert_eq!(entry.get(0).unwrap().get_span().unwrap().len(), 4);
        hashes.push(entry.get(1).unwrap().get_span().unwrap());
    }
    assert_eq!(hashes, vec![first.to_array().to_vec(), second.to_array().to_vec()]);
}
