//! Store traits.

use crate::SeekDirection;
use std::ops::Bound;

/// A batch of writes applied atomically. `None` deletes the key.
pub type WriteBatch = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// Lazily produced store entries.
pub type SeekIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Read access to a byte-keyed store.
pub trait ReadOnlyStore: Send + Sync {
    /// Reads a specified entry from the database.
    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Determines whether the database contains the specified entry.
    fn contains(&self, key: &[u8]) -> bool {
        self.try_get(key).is_some()
    }

    /// Entries whose key starts with `prefix`, in key order for
    /// [`SeekDirection::Forward`] and reverse key order otherwise.
    ///
    /// When `after` is set the scan starts just past that key in `direction`.
    /// Entries are produced on demand.
    fn seek_from(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        direction: SeekDirection,
    ) -> SeekIterator<'_>;

    /// All entries under `prefix`, starting from the first one in `direction`.
    fn seek(&self, prefix: &[u8], direction: SeekDirection) -> SeekIterator<'_> {
        self.seek_from(prefix, None, direction)
    }
}

/// A store that also accepts writes.
pub trait Store: ReadOnlyStore {
    fn put(&self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&self, key: &[u8]);

    /// Applies every change of `batch` under a single write.
    fn write_batch(&self, batch: WriteBatch) {
        for (key, value) in batch {
            match value {
                Some(value) => self.put(key, value),
                None => self.delete(&key),
            }
        }
    }
}

/// Key range scanned by a prefix seek, as `(lower, upper)` bounds over an
/// ordered map. Returns `None` when `after` lies outside the prefix.
pub fn seek_bounds(
    prefix: &[u8],
    after: Option<&[u8]>,
    direction: SeekDirection,
) -> Option<(Bound<Vec<u8>>, Bound<Vec<u8>>)> {
    if after.is_some_and(|key| !key.starts_with(prefix)) {
        return None;
    }
    let upper = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    let lower = Bound::Included(prefix.to_vec());
    Some(match (after, direction) {
        (None, _) => (lower, upper),
        (Some(key), SeekDirection::Forward) => (Bound::Excluded(key.to_vec()), upper),
        (Some(key), SeekDirection::Backward) => (lower, Bound::Excluded(key.to_vec())),
    })
}

/// Smallest key greater than every key starting with `prefix`.
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(&[1, 2]), Some(vec![1, 3]));
        assert_eq!(prefix_end(&[1, 0xff]), Some(vec![2]));
        assert_eq!(prefix_end(&[0xff, 0xff]), None);
        assert_eq!(prefix_end(&[]), None);
    }

    #[test]
    fn test_seek_bounds_rejects_foreign_resume_key() {
        assert!(seek_bounds(&[1], Some(&[2, 0]), SeekDirection::Forward).is_none());
        let (lower, upper) = seek_bounds(&[1], Some(&[1, 5]), SeekDirection::Backward).unwrap();
        assert_eq!(lower, Bound::Included(vec![1]));
        assert_eq!(upper, Bound::Excluded(vec![1, 5]));
    }
}
