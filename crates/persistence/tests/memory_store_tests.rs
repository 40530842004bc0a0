use neo_persistence::{MemoryStore, ReadOnlyStore, SeekDirection, Store};
use proptest::prelude::*;

proptest! {
    #[test]
    fn seek_matches_filtered_model(
        entries in proptest::collection::btree_map(
            proptest::collection::vec(0u8..4, 0..4),
            proptest::collection::vec(any::<u8>(), 0..4),
            0..32,
        ),
        prefix in proptest::collection::vec(0u8..4, 0..2),
    ) {
        let store = MemoryStore::new();
        for (key, value) in &entries {
            store.put(key.clone(), value.clone());
        }
        let expected: Vec<_> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        prop_assert_eq!(store.seek(&prefix, SeekDirection::Forward).collect::<Vec<_>>(), expected.clone());
        let mut reversed = expected;
        reversed.reverse();
        prop_assert_eq!(store.seek(&prefix, SeekDirection::Backward).collect::<Vec<_>>(), reversed);
    }

    /// Resuming after any stored key yields exactly the entries past it.
    #[test]
    fn seek_from_resumes_past_key(
        entries in proptest::collection::btree_map(
            proptest::collection::vec(0u8..4, 1..4),
            proptest::collection::vec(any::<u8>(), 0..4),
            1..32,
        ),
        pick in any::<proptest::sample::Index>(),
    ) {
        let store = MemoryStore::new();
        for (key, value) in &entries {
            store.put(key.clone(), value.clone());
        }
        let keys: Vec<_> = entries.keys().cloned().collect();
        let after = &keys[pick.index(keys.len())];
        let expected: Vec<_> = entries
            .iter()
            .filter(|(k, _)| *k > after)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let resumed: Vec<_> = store.seek_from(&[], Some(after.as_slice()), SeekDirection::Forward).collect();
        prop_assert_eq!(resumed, expected);
    }
}

#[test]
fn store_is_usable_behind_trait_object() {
    let store: Box<dyn Store> = Box::new(MemoryStore::new());
    store.put(b"key".to_vec(), b"value".to_vec());
    assert_eq!(store.try_get(b"key"), Some(b"value".to_vec()));
    assert!(!store.contains(b"other"));
}
