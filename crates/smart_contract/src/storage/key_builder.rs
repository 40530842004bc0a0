use super::StorageKey;
use neo_core::UInt160;

/// Builds storage keys of the form `prefix ‖ parts` for a contract id.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    id: i32,
    key: Vec<u8>,
}

impl KeyBuilder {
    pub fn new(id: i32, prefix: u8) -> Self {
        Self {
            id,
            key: vec![prefix],
        }
    }

    pub fn add(mut self, bytes: &[u8]) -> Self {
        self.key.extend_from_slice(bytes);
        self
    }

    pub fn add_u160(self, hash: &UInt160) -> Self {
        self.add(hash.as_bytes())
    }

    /// Appends `value` big-endian so that keys sort numerically.
    pub fn add_big_endian(self, value: i32) -> Self {
        self.add(&value.to_be_bytes())
    }

    pub fn build(self) -> StorageKey {
        StorageKey::new(self.id, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let key = KeyBuilder::new(-1, 12).add_big_endian(1).build();
        assert_eq!(key.id, -1);
        assert_eq!(key.key, vec![12, 0, 0, 0, 1]);

        let hash = UInt160::from([7u8; 20]);
        let key = KeyBuilder::new(3, 8).add_u160(&hash).build();
        assert_eq!(key.key.len(), 21);
        assert_eq!(&key.key[1..], hash.as_bytes());
    }
}
