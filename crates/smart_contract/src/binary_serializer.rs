//! Binary encoding of stack items.
//!
//! Both directions run on explicit work stacks, so neither deep nor
//! self-referencing input can exhaust the native call stack.

use crate::{Error, Result};
use neo_io::{BinaryWriter, MemoryReader};
use neo_vm::stack_item::{integer_from_bytes, MAX_INTEGER_SIZE};
use neo_vm::{Array, ExecutionEngineLimits, Map, StackItem, StackItemType, Struct};
use std::collections::HashSet;

/// Binary serializer helpers for VM stack items.
pub struct BinarySerializer;

#[derive(Debug, Clone, Copy)]
struct ContainerDescriptor {
    item_type: StackItemType,
    element_count: usize,
}

#[derive(Debug)]
enum PendingItem {
    Value(StackItem),
    Container(ContainerDescriptor),
}

impl BinarySerializer {
    /// Deserializes a stack item, bounded by the engine limits and the data length.
    pub fn deserialize(data: &[u8], limits: &ExecutionEngineLimits) -> Result<StackItem> {
        let max_size = data.len().min(limits.max_item_size as usize);
        let mut reader = MemoryReader::new(data);
        Self::deserialize_with_limits(&mut reader, max_size, limits.max_stack_size as usize)
    }

    /// Deserializes a stack item from `reader`.
    ///
    /// The first pass reads the flat item list, leaving a placeholder per
    /// container. The second pass rebuilds containers bottom-up.
    pub fn deserialize_with_limits(
        reader: &mut MemoryReader<'_>,
        max_size: usize,
        max_items: usize,
    ) -> Result<StackItem> {
        let mut deserialized: Vec<PendingItem> = Vec::new();
        let mut undeserialized = 1usize;
        while undeserialized > 0 {
            undeserialized -= 1;
            let tag = reader.read_u8()?;
            let item_type = StackItemType::from_u8(tag)
                .ok_or_else(|| Error::format(format!("unknown stack item type: {tag:#04x}")))?;
            let pending = match item_type {
                StackItemType::Any => PendingItem::Value(StackItem::Null),
                StackItemType::Boolean => PendingItem::Value(StackItem::Boolean(reader.read_bool()?)),
                StackItemType::Integer => {
                    let bytes = reader.read_var_memory(MAX_INTEGER_SIZE)?;
                    PendingItem::Value(StackItem::Integer(integer_from_bytes(bytes)?))
                }
                StackItemType::ByteString => {
                    PendingItem::Value(StackItem::ByteString(reader.read_var_bytes(max_size)?))
                }
                StackItemType::Buffer => {
                    PendingItem::Value(StackItem::Buffer(reader.read_var_bytes(max_size)?))
                }
                StackItemType::Array | StackItemType::Struct => {
                    let count = reader.read_var_int(max_items as u64)? as usize;
                    undeserialized += count;
                    PendingItem::Container(ContainerDescriptor {
                        item_type,
                        element_count: count,
                    })
                }
                StackItemType::Map => {
                    let count = reader.read_var_int(max_items as u64)? as usize;
                    undeserialized += count * 2;
                    PendingItem::Container(ContainerDescriptor {
                        item_type,
                        element_count: count,
                    })
                }
                StackItemType::Pointer | StackItemType::InteropInterface => {
                    return Err(Error::format(format!(
                        "{} cannot be deserialized",
                        item_type.name()
                    )));
                }
            };
            deserialized.push(pending);
            if deserialized.len() > max_items {
                return Err(Error::format(format!(
                    "item count exceeds limit {max_items}"
                )));
            }
        }

        let mut stack_temp: Vec<StackItem> = Vec::new();
        while let Some(pending) = deserialized.pop() {
            let item = match pending {
                PendingItem::Value(item) => item,
                PendingItem::Container(descriptor) => {
                    Self::rebuild_container(descriptor, &mut stack_temp)?
                }
            };
            stack_temp.push(item);
        }
        stack_temp
            .pop()
            .ok_or_else(|| Error::format("empty serialized item"))
    }

    fn rebuild_container(
        descriptor: ContainerDescriptor,
        stack_temp: &mut Vec<StackItem>,
    ) -> Result<StackItem> {
        let mut next = || {
            stack_temp
                .pop()
                .ok_or_else(|| Error::format("container is missing elements"))
        };
        match descriptor.item_type {
            StackItemType::Array => {
                let array = Array::new(Vec::with_capacity(descriptor.element_count));
                for _ in 0..descriptor.element_count {
                    array.push(next()?);
                }
                Ok(StackItem::Array(array))
            }
            StackItemType::Struct => {
                let st = Struct::new(Vec::with_capacity(descriptor.element_count));
                for _ in 0..descriptor.element_count {
                    st.push(next()?);
                }
                Ok(StackItem::Struct(st))
            }
            _ => {
                let map = Map::new();
                for _ in 0..descriptor.element_count {
                    let key = next()?;
                    let value = next()?;
                    map.insert(key, value)?;
                }
                Ok(StackItem::Map(map))
            }
        }
    }

    /// Serializes a stack item bounded by the engine limits.
    pub fn serialize(item: &StackItem, limits: &ExecutionEngineLimits) -> Result<Vec<u8>> {
        Self::serialize_with_limits(
            item,
            limits.max_item_size as usize,
            limits.max_stack_size as usize,
        )
    }

    /// Serializes `item`, failing once the output exceeds `max_size` bytes or
    /// more than `max_items` items have been written.
    ///
    /// Containers may appear only once in the graph; a repeated container is
    /// rejected whether it forms a cycle or is merely shared.
    pub fn serialize_with_limits(
        item: &StackItem,
        max_size: usize,
        max_items: usize,
    ) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::new();
        let mut serialized: HashSet<usize> = HashSet::new();
        let mut unserialized: Vec<StackItem> = vec![item.clone()];
        let mut remaining_items = max_items;
        while let Some(item) = unserialized.pop() {
            remaining_items = remaining_items
                .checked_sub(1)
                .ok_or_else(|| Error::format(format!("item count exceeds limit {max_items}")))?;
            writer.write_u8(item.item_type() as u8);
            match &item {
                StackItem::Null => {}
                StackItem::Boolean(value) => writer.write_bool(*value),
                StackItem::Integer(_) | StackItem::ByteString(_) | StackItem::Buffer(_) => {
                    writer.write_var_bytes(&item.get_span()?);
                }
                StackItem::Array(array) => {
                    Self::mark_serialized(&mut serialized, array.id())?;
                    writer.write_var_int(array.len() as u64);
                    unserialized.extend(array.items().iter().rev().cloned());
                }
                StackItem::Struct(st) => {
                    Self::mark_serialized(&mut serialized, st.id())?;
                    writer.write_var_int(st.len() as u64);
                    unserialized.extend(st.items().iter().rev().cloned());
                }
                StackItem::Map(map) => {
                    Self::mark_serialized(&mut serialized, map.id())?;
                    writer.write_var_int(map.len() as u64);
                    for (key, value) in map.entries().iter().rev() {
                        unserialized.push(value.clone());
                        unserialized.push(key.clone());
                    }
                }
                StackItem::Pointer(_) | StackItem::InteropInterface(_) => {
                    return Err(Error::not_supported(format!(
                        "{} cannot be serialized",
                        item.item_type().name()
                    )));
                }
            }
            if writer.len() > max_size {
                return Err(Error::format(format!(
                    "serialized size {} exceeds limit {max_size}",
                    writer.len()
                )));
            }
        }
        Ok(writer.to_bytes())
    }

    fn mark_serialized(serialized: &mut HashSet<usize>, id: usize) -> Result<()> {
        if !serialized.insert(id) {
            return Err(Error::not_supported(
                "container appears more than once in the item graph",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn limits() -> ExecutionEngineLimits {
        ExecutionEngineLimits::default()
    }

    #[test]
    fn test_serialize_primitives() {
        let cases = [
            (StackItem::from(vec![0u8; 5]), vec![0x28, 0x05, 0, 0, 0, 0, 0]),
            (StackItem::from(true), vec![0x20, 0x01]),
            (StackItem::from(1), vec![0x21, 0x01, 0x01]),
            (StackItem::from(0), vec![0x21, 0x00]),
            (StackItem::Null, vec![0x00]),
            (StackItem::Buffer(vec![7]), vec![0x30, 0x01, 0x07]),
        ];
        for (item, expected) in cases {
            assert_eq!(BinarySerializer::serialize(&item, &limits()).unwrap(), expected);
        }
    }

    #[test]
    fn test_serialize_containers() {
        let array = StackItem::new_array(vec![StackItem::from(1)]);
        assert_eq!(
            BinarySerializer::serialize(&array, &limits()).unwrap(),
            vec![0x40, 0x01, 0x21, 0x01, 0x01]
        );
        let st = StackItem::new_struct(vec![StackItem::from(1)]);
        assert_eq!(
            BinarySerializer::serialize(&st, &limits()).unwrap(),
            vec![0x41, 0x01, 0x21, 0x01, 0x01]
        );
        let map = Map::new();
        map.insert(StackItem::from(2), StackItem::from(1)).unwrap();
        assert_eq!(
            BinarySerializer::serialize(&StackItem::Map(map), &limits()).unwrap(),
            vec![0x48, 0x01, 0x21, 0x01, 0x02, 0x21, 0x01, 0x01]
        );
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let array = Array::new(vec![]);
        array.push(StackItem::Array(array.clone()));
        assert!(matches!(
            BinarySerializer::serialize(&StackItem::Array(array), &limits()),
            Err(Error::NotSupported(_))
        ));

        let map = Map::new();
        map.insert(StackItem::from("self"), StackItem::Map(map.clone())).unwrap();
        assert!(BinarySerializer::serialize(&StackItem::Map(map), &limits()).is_err());
    }

    #[test]
    fn test_shared_container_is_rejected() {
        let shared = StackItem::new_array(vec![]);
        let outer = StackItem::new_array(vec![shared.clone(), shared]);
        assert!(BinarySerializer::serialize(&outer, &limits()).is_err());
    }

    #[test]
    fn test_item_budget_is_exact() {
        let item = StackItem::new_array(vec![StackItem::from(1), StackItem::from(2)]);
        assert!(BinarySerializer::serialize_with_limits(&item, 1024, 3).is_ok());
        assert!(BinarySerializer::serialize_with_limits(&item, 1024, 2).is_err());

        let bytes = BinarySerializer::serialize(&item, &limits()).unwrap();
        let mut reader = MemoryReader::new(&bytes);
        assert!(BinarySerializer::deserialize_with_limits(&mut reader, 1024, 3).is_ok());
        let mut reader = MemoryReader::new(&bytes);
        assert!(BinarySerializer::deserialize_with_limits(&mut reader, 1024, 2).is_err());
    }

    #[test]
    fn test_size_ceiling() {
        let item = StackItem::from(vec![0u8; 10]);
        assert!(BinarySerializer::serialize_with_limits(&item, 12, 16).is_ok());
        assert!(BinarySerializer::serialize_with_limits(&item, 11, 16).is_err());
    }

    #[test]
    fn test_deserialize_rejects_bad_input() {
        assert!(BinarySerializer::deserialize(&[0x99], &limits()).is_err());
        assert!(BinarySerializer::deserialize(&[0x60], &limits()).is_err());
        assert!(BinarySerializer::deserialize(&[0x40, 0x02, 0x21, 0x00], &limits()).is_err());
        assert!(BinarySerializer::deserialize(&[0x21, 0x21], &limits()).is_err());
        assert!(BinarySerializer::deserialize(&[], &limits()).is_err());
    }

    #[test]
    fn test_roundtrip_nested() {
        let map = Map::new();
        map.insert(StackItem::from("k"), StackItem::new_struct(vec![StackItem::Null]))
            .unwrap();
        let item = StackItem::new_array(vec![
            StackItem::Map(map),
            StackItem::from(BigInt::from(-1_000_000_007i64)),
            StackItem::from(false),
        ]);
        let bytes = BinarySerializer::serialize(&item, &limits()).unwrap();
        assert_eq!(BinarySerializer::deserialize(&bytes, &limits()).unwrap(), item);
    }
}
