//! Contract-scoped storage keys.

use neo_io::{IoError, IoResult};
use std::fmt;

/// A key in contract storage: the owning contract id and the raw key bytes.
///
/// The binary form is the id as 4 little-endian bytes followed by the key,
/// with no length prefix. It is used verbatim as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorageKey {
    pub id: i32,
    pub key: Vec<u8>,
}

impl StorageKey {
    /// Size of the id prefix.
    pub const PREFIX_LENGTH: usize = std::mem::size_of::<i32>();

    pub fn new(id: i32, key: Vec<u8>) -> Self {
        Self { id, key }
    }

    /// The store-level prefix for every key of contract `id` starting with `prefix`.
    pub fn create_search_prefix(id: i32, prefix: &[u8]) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(Self::PREFIX_LENGTH + prefix.len());
        buffer.extend_from_slice(&id.to_le_bytes());
        buffer.extend_from_slice(prefix);
        buffer
    }

    pub fn to_array(&self) -> Vec<u8> {
        Self::create_search_prefix(self.id, &self.key)
    }

    /// Parses a raw store key.
    pub fn from_bytes(bytes: &[u8]) -> IoResult<Self> {
        if bytes.len() < Self::PREFIX_LENGTH {
            return Err(IoError::EndOfStream);
        }
        let (id, key) = bytes.split_at(Self::PREFIX_LENGTH);
        let id = i32::from_le_bytes([id[0], id[1], id[2], id[3]]);
        Ok(Self::new(id, key.to_vec()))
    }

    pub fn len(&self) -> usize {
        Self::PREFIX_LENGTH + self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey(id: {}, key: {})", self.id, hex::encode(&self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_form_is_id_then_key() {
        let key = StorageKey::new(-1, vec![0xAA, 0xBB]);
        assert_eq!(key.to_array(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0xAA, 0xBB]);
        assert_eq!(StorageKey::from_bytes(&key.to_array()).unwrap(), key);
        assert_eq!(key.len(), 6);
    }

    #[test]
    fn test_search_prefix_matches_key_prefix() {
        let key = StorageKey::new(7, vec![1, 2, 3]);
        assert!(key.to_array().starts_with(&StorageKey::create_search_prefix(7, &[1, 2])));
        assert!(!key.to_array().starts_with(&StorageKey::create_search_prefix(8, &[])));
    }

    #[test]
    fn test_from_bytes_requires_id() {
        assert!(StorageKey::from_bytes(&[1, 2, 3]).is_err());
        assert_eq!(StorageKey::from_bytes(&[1, 0, 0, 0]).unwrap(), StorageKey::new(1, vec![]));
    }
}
