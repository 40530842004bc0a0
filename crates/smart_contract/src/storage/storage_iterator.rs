use super::{FindOptions, StorageItem, StorageKey};
use crate::binary_serializer::BinarySerializer;
use crate::data_cache::DataCache;
use crate::{Error, Result};
use neo_persistence::SeekDirection;
use neo_vm::{ExecutionEngineLimits, InteropInterface, StackItem};
use std::any::Any;
use std::cell::RefCell;

/// Walks the entries of a storage search, projecting each one according to
/// its [`FindOptions`].
///
/// The iterator keeps only a cursor. Every [`StorageIterator::next`] reads one
/// more entry from the snapshot past the last key it returned, so writes made
/// ahead of the cursor are observed and writes behind it are not.
#[derive(Debug)]
pub struct StorageIterator {
    search_prefix: Vec<u8>,
    prefix_length: usize,
    options: FindOptions,
    limits: ExecutionEngineLimits,
    cursor: RefCell<Cursor>,
}

#[derive(Debug)]
enum Cursor {
    Start,
    At(StorageKey, StorageItem),
    End,
}

impl StorageIterator {
    /// `search_prefix` is the raw prefix scanned, `prefix_length` the part of
    /// each entry key that `REMOVE_PREFIX` strips.
    pub fn new(
        search_prefix: Vec<u8>,
        prefix_length: usize,
        options: FindOptions,
        limits: ExecutionEngineLimits,
    ) -> Self {
        Self {
            search_prefix,
            prefix_length,
            options,
            limits,
            cursor: RefCell::new(Cursor::Start),
        }
    }

    fn direction(&self) -> SeekDirection {
        if self.options.contains(FindOptions::BACKWARDS) {
            SeekDirection::Backward
        } else {
            SeekDirection::Forward
        }
    }

    /// Advances to the next entry. Returns `false` once the entries are exhausted.
    pub fn next(&self, snapshot: &DataCache) -> bool {
        let after = match &*self.cursor.borrow() {
            Cursor::Start => None,
            Cursor::At(key, _) => Some(key.to_array()),
            Cursor::End => return false,
        };
        let entry = snapshot
            .find_from(&self.search_prefix, after.as_deref(), self.direction())
            .next();
        let advanced = entry.is_some();
        *self.cursor.borrow_mut() = match entry {
            Some((key, item)) => Cursor::At(key, item),
            None => Cursor::End,
        };
        advanced
    }

    /// The projection of the current entry.
    pub fn value(&self) -> Result<StackItem> {
        let cursor = self.cursor.borrow();
        let Cursor::At(key, item) = &*cursor else {
            return Err(Error::state("iterator is not positioned on an entry"));
        };

        let mut key_bytes = key.key.as_slice();
        if self.options.contains(FindOptions::REMOVE_PREFIX) {
            key_bytes = key_bytes.get(self.prefix_length..).unwrap_or_default();
        }
        let value = item.value()?;
        let mut value_item = if self.options.contains(FindOptions::DESERIALIZE_VALUES) {
            BinarySerializer::deserialize(&value, &self.limits)?
        } else {
            StackItem::from(value)
        };
        if self.options.contains(FindOptions::PICK_FIELD0) {
            value_item = pick_field(&value_item, 0)?;
        } else if self.options.contains(FindOptions::PICK_FIELD1) {
            value_item = pick_field(&value_item, 1)?;
        }

        if self.options.contains(FindOptions::KEYS_ONLY) {
            return Ok(StackItem::from(key_bytes));
        }
        if self.options.contains(FindOptions::VALUES_ONLY) {
            return Ok(value_item);
        }
        Ok(StackItem::new_struct(vec![StackItem::from(key_bytes), value_item]))
    }
}

fn pick_field(item: &StackItem, index: usize) -> Result<StackItem> {
    let field = match item {
        StackItem::Array(array) => array.get(index),
        StackItem::Struct(st) => st.get(index),
        other => {
            return Err(Error::format(format!(
                "cannot pick field {index} of {}",
                other.item_type().name()
            )))
        }
    };
    field.ok_or_else(|| Error::format(format!("value has no field {index}")))
}

impl InteropInterface for StorageIterator {
    fn interface_type(&self) -> &str {
        "StorageIterator"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_persistence::{MemoryStore, Store};
    use std::sync::Arc;

    fn snapshot() -> DataCache {
        let value = BinarySerializer::serialize(
            &StackItem::new_array(vec![StackItem::from(10), StackItem::from("ten")]),
            &ExecutionEngineLimits::default(),
        )
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put(StorageKey::new(1, vec![0xAA, 0x01]).to_array(), value.clone());
        store.put(StorageKey::new(1, vec![0xAA, 0x02]).to_array(), value);
        store.put(StorageKey::new(1, vec![0xBB]).to_array(), vec![0]);
        store.put(StorageKey::new(2, vec![1]).to_array(), vec![0x21, 0x01, 0x05]);
        DataCache::new(store)
    }

    fn iterator(options: FindOptions) -> StorageIterator {
        StorageIterator::new(
            StorageKey::create_search_prefix(1, &[0xAA]),
            1,
            options,
            ExecutionEngineLimits::default(),
        )
    }

    #[test]
    fn test_value_requires_next() {
        let snapshot = snapshot();
        let iter = iterator(FindOptions::NONE);
        assert!(iter.value().is_err());
        assert!(iter.next(&snapshot));
        assert!(iter.next(&snapshot));
        assert!(!iter.next(&snapshot));
        assert!(iter.value().is_err());
        assert!(!iter.next(&snapshot));
    }

    #[test]
    fn test_keys_only_with_remove_prefix() {
        let snapshot = snapshot();
        let iter = iterator(FindOptions::KEYS_ONLY | FindOptions::REMOVE_PREFIX);
        iter.next(&snapshot);
        assert_eq!(iter.value().unwrap(), StackItem::from(vec![0x01u8]));
    }

    #[test]
    fn test_backwards_walks_in_reverse() {
        let snapshot = snapshot();
        let iter = iterator(FindOptions::KEYS_ONLY | FindOptions::BACKWARDS);
        iter.next(&snapshot);
        assert_eq!(iter.value().unwrap(), StackItem::from(vec![0xAAu8, 0x02]));
        iter.next(&snapshot);
        assert_eq!(iter.value().unwrap(), StackItem::from(vec![0xAAu8, 0x01]));
    }

    #[test]
    fn test_reads_entries_added_ahead_of_cursor() {
        let mut snapshot = snapshot();
        let iter = iterator(FindOptions::KEYS_ONLY);
        assert!(iter.next(&snapshot));
        snapshot
            .add(StorageKey::new(1, vec![0xAA, 0x00]), StorageItem::new(vec![1]))
            .unwrap();
        snapshot
            .add(StorageKey::new(1, vec![0xAA, 0x03]), StorageItem::new(vec![3]))
            .unwrap();
        assert!(iter.next(&snapshot));
        assert_eq!(iter.value().unwrap(), StackItem::from(vec![0xAAu8, 0x02]));
        assert!(iter.next(&snapshot));
        assert_eq!(iter.value().unwrap(), StackItem::from(vec![0xAAu8, 0x03]));
        assert!(!iter.next(&snapshot));
    }

    #[test]
    fn test_default_projection_is_key_value_struct() {
        let snapshot = snapshot();
        let iter = iterator(FindOptions::NONE);
        iter.next(&snapshot);
        match iter.value().unwrap() {
            StackItem::Struct(st) => {
                assert_eq!(st.len(), 2);
                assert_eq!(st.get(0), Some(StackItem::from(vec![0xAAu8, 0x01])));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pick_field() {
        let snapshot = snapshot();
        let iter = iterator(
            FindOptions::VALUES_ONLY | FindOptions::DESERIALIZE_VALUES | FindOptions::PICK_FIELD1,
        );
        iter.next(&snapshot);
        assert_eq!(iter.value().unwrap(), StackItem::from("ten"));

        let raw = StorageIterator::new(
            StorageKey::create_search_prefix(2, &[]),
            0,
            FindOptions::DESERIALIZE_VALUES | FindOptions::PICK_FIELD0,
            ExecutionEngineLimits::default(),
        );
        raw.next(&snapshot);
        assert!(raw.value().is_err());
    }
}
