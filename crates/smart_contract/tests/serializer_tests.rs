//! Property tests for the stack item serializers.

use neo_smart_contract::json_serializer::{MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};
use neo_smart_contract::{BinarySerializer, JsonSerializer};
use neo_vm::{ExecutionEngineLimits, Map, StackItem};
use num_bigint::BigInt;
use proptest::prelude::*;

fn binary_item() -> impl Strategy<Value = StackItem> {
    let leaf = prop_oneof![
        Just(StackItem::Null),
        any::<bool>().prop_map(StackItem::from),
        any::<i64>().prop_map(StackItem::from),
        prop::collection::vec(any::<u8>(), 0..=32)
            .prop_map(|bytes| StackItem::from(BigInt::from_signed_bytes_le(&bytes))),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(StackItem::from),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(StackItem::Buffer),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(StackItem::new_array),
            prop::collection::vec(inner.clone(), 0..6).prop_map(StackItem::new_struct),
            prop::collection::vec((map_key(), inner), 0..4).prop_map(new_map),
        ]
    })
}

/// Primitive keys no longer than the 64 bytes a map key may hold.
fn map_key() -> impl Strategy<Value = StackItem> {
    prop_oneof![
        any::<bool>().prop_map(StackItem::from),
        any::<i64>().prop_map(StackItem::from),
        prop::collection::vec(any::<u8>(), 0..=64).prop_map(StackItem::from),
    ]
}

/// Later entries replace earlier ones under an equal key.
fn new_map(entries: Vec<(StackItem, StackItem)>) -> StackItem {
    let map = Map::new();
    for (key, value) in entries {
        map.insert(key, value).unwrap();
    }
    StackItem::Map(map)
}

fn json_item() -> impl Strategy<Value = StackItem> {
    let leaf = prop_oneof![
        Just(StackItem::Null),
        any::<bool>().prop_map(StackItem::from),
        (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).prop_map(StackItem::from),
        "\\PC{0,12}".prop_map(StackItem::from),
    ];
    leaf.prop_recursive(3, 24, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(StackItem::new_array),
            prop::collection::vec(("[a-z]{0,8}".prop_map(StackItem::from), inner), 0..4)
                .prop_map(new_map),
        ]
    })
}

proptest! {
    /// Deserializing what was serialized gives back an item that serializes
    /// to the same bytes.
    #[test]
    fn prop_binary_roundtrip_is_stable(item in binary_item()) {
        let limits = ExecutionEngineLimits::default();
        let bytes = BinarySerializer::serialize(&item, &limits).unwrap();
        let decoded = BinarySerializer::deserialize(&bytes, &limits).unwrap();
        prop_assert_eq!(BinarySerializer::serialize(&decoded, &limits).unwrap(), bytes);
    }

    /// The size ceiling is exact: the encoded length passes, one byte less fails.
    #[test]
    fn prop_binary_size_ceiling_is_exact(item in binary_item()) {
        let bytes = BinarySerializer::serialize(&item, &ExecutionEngineLimits::default()).unwrap();
        prop_assert!(BinarySerializer::serialize_with_limits(&item, bytes.len(), 2048).is_ok());
        prop_assert!(BinarySerializer::serialize_with_limits(&item, bytes.len() - 1, 2048).is_err());
    }

    #[test]
    fn prop_truncated_input_is_rejected(item in binary_item(), cut in any::<prop::sample::Index>()) {
        let limits = ExecutionEngineLimits::default();
        let bytes = BinarySerializer::serialize(&item, &limits).unwrap();
        let len = cut.index(bytes.len());
        prop_assert!(BinarySerializer::deserialize(&bytes[..len], &limits).is_err());
    }

    /// The JSON text is valid JSON and reads back to the same text.
    #[test]
    fn prop_json_roundtrip_is_stable(item in json_item()) {
        let text = JsonSerializer::serialize_to_byte_array(&item, 1 << 20).unwrap();
        prop_assert!(serde_json::from_slice::<serde_json::Value>(&text).is_ok());

        let parsed = JsonSerializer::parse(&text, 10).unwrap();
        let decoded = JsonSerializer::deserialize(&parsed, &ExecutionEngineLimits::default()).unwrap();
        prop_assert_eq!(JsonSerializer::serialize_to_byte_array(&decoded, 1 << 20).unwrap(), text);
    }

    /// Both JSON writers agree on the document they produce.
    #[test]
    fn prop_json_writers_agree(item in json_item()) {
        let text = JsonSerializer::serialize_to_byte_array(&item, 1 << 20).unwrap();
        let value = JsonSerializer::serialize(&item, 2048).unwrap();
        let reparsed: serde_json::Value = serde_json::from_slice(&text).unwrap();
        prop_assert_eq!(value, reparsed);
    }
}
