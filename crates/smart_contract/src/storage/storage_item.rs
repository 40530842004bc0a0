//! Storage values.

use crate::binary_serializer::BinarySerializer;
use crate::{Error, Interoperable, Result};
use neo_vm::stack_item::{integer_from_bytes, integer_to_bytes};
use neo_vm::ExecutionEngineLimits;
use num_bigint::BigInt;

/// The authoritative representation of a storage value.
#[derive(Debug, Clone)]
enum ItemState {
    Raw(Vec<u8>),
    Integer(BigInt),
    Interoperable(Box<dyn Interoperable>),
}

/// A value in contract storage.
///
/// Exactly one representation is held at a time. Reading the byte form of an
/// integer or interoperable value encodes it on the fly, and decoding a typed
/// view with [`StorageItem::get_interoperable`] replaces the raw bytes, so the
/// two can never disagree.
#[derive(Debug, Clone)]
pub struct StorageItem {
    state: ItemState,
}

impl Default for StorageItem {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StorageItem {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            state: ItemState::Raw(value),
        }
    }

    pub fn from_integer(value: BigInt) -> Self {
        Self {
            state: ItemState::Integer(value),
        }
    }

    pub fn from_interoperable(value: Box<dyn Interoperable>) -> Self {
        Self {
            state: ItemState::Interoperable(value),
        }
    }

    /// The byte form of the value.
    pub fn value(&self) -> Result<Vec<u8>> {
        match &self.state {
            ItemState::Raw(bytes) => Ok(bytes.clone()),
            ItemState::Integer(value) => Ok(integer_to_bytes(value)),
            ItemState::Interoperable(value) => BinarySerializer::serialize(
                &value.to_stack_item()?,
                &ExecutionEngineLimits::default(),
            ),
        }
    }

    /// Replaces the value with raw bytes.
    pub fn set_value(&mut self, value: Vec<u8>) {
        self.state = ItemState::Raw(value);
    }

    pub fn to_integer(&self) -> Result<BigInt> {
        match &self.state {
            ItemState::Raw(bytes) => Ok(integer_from_bytes(bytes)?),
            ItemState::Integer(value) => Ok(value.clone()),
            ItemState::Interoperable(_) => Err(Error::format(
                "storage item holds a structured value, not an integer",
            )),
        }
    }

    pub fn set_integer(&mut self, value: BigInt) {
        self.state = ItemState::Integer(value);
    }

    /// Adds `delta` to the integer value.
    pub fn add(&mut self, delta: BigInt) -> Result<()> {
        let value = self.to_integer()? + delta;
        self.set_integer(value);
        Ok(())
    }

    pub fn set_interoperable(&mut self, value: Box<dyn Interoperable>) {
        self.state = ItemState::Interoperable(value);
    }

    /// Decodes the value as `T`, keeping the decoded object as the
    /// representation from now on.
    pub fn get_interoperable<T>(&mut self) -> Result<&mut T>
    where
        T: Interoperable + Default + 'static,
    {
        let decoded = match &self.state {
            ItemState::Interoperable(value) if value.as_any().is::<T>() => None,
            _ => {
                let item = BinarySerializer::deserialize(
                    &self.value()?,
                    &ExecutionEngineLimits::default(),
                )?;
                let mut value = T::default();
                value.from_stack_item(&item)?;
                Some(value)
            }
        };
        if let Some(value) = decoded {
            self.state = ItemState::Interoperable(Box::new(value));
        }
        match &mut self.state {
            ItemState::Interoperable(value) => value
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| Error::format("storage item type mismatch")),
            _ => Err(Error::format("storage item type mismatch")),
        }
    }
}

impl From<Vec<u8>> for StorageItem {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<BigInt> for StorageItem {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interoperable::fields_of;
    use neo_vm::StackItem;
    use std::any::Any;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        owner: Vec<u8>,
        count: BigInt,
    }

    impl Interoperable for Counter {
        fn from_stack_item(&mut self, item: &StackItem) -> Result<()> {
            let fields = fields_of(item, "Counter")?;
            self.owner = fields[0].get_span()?;
            self.count = fields[1].get_integer()?;
            Ok(())
        }

        fn to_stack_item(&self) -> Result<StackItem> {
            Ok(StackItem::new_struct(vec![
                StackItem::from(self.owner.clone()),
                StackItem::from(self.count.clone()),
            ]))
        }

        fn clone_box(&self) -> Box<dyn Interoperable> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_integer_representation() {
        let mut item = StorageItem::from_integer(BigInt::from(255));
        assert_eq!(item.value().unwrap(), vec![0xFF, 0x00]);
        item.add(BigInt::from(1)).unwrap();
        assert_eq!(item.to_integer().unwrap(), BigInt::from(256));
        item.set_value(vec![0x02]);
        assert_eq!(item.to_integer().unwrap(), BigInt::from(2));
        assert_eq!(StorageItem::default().to_integer().unwrap(), BigInt::from(0));
    }

    #[test]
    fn test_interoperable_mutation_is_visible_in_bytes() {
        let original = Counter {
            owner: vec![1, 2],
            count: BigInt::from(5),
        };
        let mut item = StorageItem::from_interoperable(Box::new(original.clone()));
        let bytes = item.value().unwrap();

        let mut reloaded = StorageItem::new(bytes);
        assert_eq!(*reloaded.get_interoperable::<Counter>().unwrap(), original);

        reloaded.get_interoperable::<Counter>().unwrap().count = BigInt::from(6);
        let mut again = StorageItem::new(reloaded.value().unwrap());
        assert_eq!(again.get_interoperable::<Counter>().unwrap().count, BigInt::from(6));
        assert!(again.to_integer().is_err());
    }

    #[test]
    fn test_garbage_bytes_do_not_decode() {
        let mut item = StorageItem::new(vec![0xFF, 0x00]);
        assert!(item.get_interoperable::<Counter>().is_err());
    }
}
