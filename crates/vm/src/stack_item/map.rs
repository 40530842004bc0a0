use super::StackItem;
use crate::{VmError, VmResult};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// An insertion-ordered map with primitive keys.
#[derive(Clone, Default)]
pub struct Map {
    entries: Rc<RefCell<Vec<(StackItem, StackItem)>>>,
}

impl Map {
    /// The maximum size of a key in bytes.
    pub const MAX_KEY_SIZE: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the underlying entry table.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.entries) as usize
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check_key(key: &StackItem) -> VmResult<()> {
        if !key.item_type().is_primitive() {
            return Err(VmError::invalid_type("primitive map key", key.item_type().name()));
        }
        let size = key.get_span()?.len();
        if size > Self::MAX_KEY_SIZE {
            return Err(VmError::SizeExceeded {
                size,
                limit: Self::MAX_KEY_SIZE,
            });
        }
        Ok(())
    }

    /// Inserts or replaces the value for `key`, keeping the original position.
    pub fn insert(&self, key: StackItem, value: StackItem) -> VmResult<()> {
        Self::check_key(&key)?;
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k.primitive_eq(&key)) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }

    pub fn get(&self, key: &StackItem) -> Option<StackItem> {
        self.entries
            .borrow()
            .iter()
            .find(|(k, _)| k.primitive_eq(key))
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &StackItem) -> bool {
        self.entries.borrow().iter().any(|(k, _)| k.primitive_eq(key))
    }

    pub fn entries(&self) -> Ref<'_, Vec<(StackItem, StackItem)>> {
        self.entries.borrow()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.entries.borrow() == *other.entries.borrow()
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.borrow().iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
