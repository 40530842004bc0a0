use crate::{seek_bounds, ReadOnlyStore, SeekDirection, SeekIterator, Store, WriteBatch};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::debug;

/// An in-memory store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner_data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the store, clearing all data.
    pub fn reset(&self) {
        self.inner_data.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner_data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner_data.read().is_empty()
    }
}

impl ReadOnlyStore for MemoryStore {
    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner_data.read().get(key).cloned()
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.inner_data.read().contains_key(key)
    }

    fn seek_from(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        direction: SeekDirection,
    ) -> SeekIterator<'_> {
        match seek_bounds(prefix, after, direction) {
            Some((lower, upper)) => Box::new(MemorySeek {
                data: self.inner_data.read(),
                lower,
                upper,
                direction,
            }),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Walks the map one entry at a time, narrowing its bounds past every key
/// it yields. Holds the read lock until dropped.
struct MemorySeek<'a> {
    data: RwLockReadGuard<'a, BTreeMap<Vec<u8>, Vec<u8>>>,
    lower: Bound<Vec<u8>>,
    upper: Bound<Vec<u8>>,
    direction: SeekDirection,
}

impl Iterator for MemorySeek<'_> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut range = self
            .data
            .range::<Vec<u8>, _>((self.lower.as_ref(), self.upper.as_ref()));
        let (key, value) = match self.direction {
            SeekDirection::Forward => range.next(),
            SeekDirection::Backward => range.next_back(),
        }?;
        let entry = (key.clone(), value.clone());
        match self.direction {
            SeekDirection::Forward => self.lower = Bound::Excluded(entry.0.clone()),
            SeekDirection::Backward => self.upper = Bound::Excluded(entry.0.clone()),
        }
        Some(entry)
    }
}

impl Store for MemoryStore {
    fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.inner_data.write().insert(key, value);
    }

    fn delete(&self, key: &[u8]) {
        self.inner_data.write().remove(key);
    }

    fn write_batch(&self, batch: WriteBatch) {
        let mut data = self.inner_data.write();
        debug!(changes = batch.len(), "writing batch to memory store");
        for (key, value) in batch {
            match value {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put(vec![1, 2], vec![3]);
        assert_eq!(store.try_get(&[1, 2]), Some(vec![3]));
        assert!(store.contains(&[1, 2]));
        store.delete(&[1, 2]);
        assert!(!store.contains(&[1, 2]));
        assert!(store.is_empty());
    }

    #[test]
    fn test_seek_respects_prefix_and_direction() {
        let store = MemoryStore::new();
        store.put(vec![1, 0], vec![0]);
        store.put(vec![1, 2], vec![2]);
        store.put(vec![1, 1], vec![1]);
        store.put(vec![2, 0], vec![9]);
        store.put(vec![0, 9], vec![9]);

        let forward: Vec<_> = store
            .seek(&[1], SeekDirection::Forward)
            .map(|(_, v)| v[0])
            .collect();
        assert_eq!(forward, vec![0, 1, 2]);

        let backward: Vec<_> = store
            .seek(&[1], SeekDirection::Backward)
            .map(|(_, v)| v[0])
            .collect();
        assert_eq!(backward, vec![2, 1, 0]);
        assert_eq!(store.seek(&[], SeekDirection::Forward).count(), 5);
    }

    #[test]
    fn test_seek_resumes_after_key() {
        let store = MemoryStore::new();
        for i in 0..5u8 {
            store.put(vec![1, i], vec![i]);
        }
        store.put(vec![2], vec![9]);

        let forward: Vec<_> = store
            .seek_from(&[1], Some(&[1, 2]), SeekDirection::Forward)
            .map(|(_, v)| v[0])
            .collect();
        assert_eq!(forward, vec![3, 4]);

        let backward: Vec<_> = store
            .seek_from(&[1], Some(&[1, 2]), SeekDirection::Backward)
            .map(|(_, v)| v[0])
            .collect();
        assert_eq!(backward, vec![1, 0]);

        // The resume key itself need not exist.
        let mut resumed = store.seek_from(&[1], Some(&[1, 2, 7]), SeekDirection::Forward);
        assert_eq!(resumed.next(), Some((vec![1, 3], vec![3])));
    }

    #[test]
    fn test_seek_yields_on_demand() {
        let store = MemoryStore::new();
        store.put(vec![0xff, 1], vec![1]);
        store.put(vec![0xff, 2], vec![2]);
        let mut entries = store.seek(&[0xff], SeekDirection::Backward);
        assert_eq!(entries.next(), Some((vec![0xff, 2], vec![2])));
        assert_eq!(entries.next(), Some((vec![0xff, 1], vec![1])));
        assert_eq!(entries.next(), None);
    }

    #[test]
    fn test_write_batch() {
        let store = MemoryStore::new();
        store.put(vec![1], vec![1]);
        store.write_batch(vec![(vec![1], None), (vec![2], Some(vec![2]))]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.try_get(&[2]), Some(vec![2]));
        store.reset();
        assert!(store.is_empty());
    }
}
