//! Host objects with a stack item form.

use crate::Result;
use neo_vm::StackItem;
use std::any::Any;
use std::fmt;

/// A host object that converts to and from a stack item.
///
/// Storage items persist interoperable values through the binary serializer
/// applied to [`Interoperable::to_stack_item`].
pub trait Interoperable: fmt::Debug {
    /// Loads the object's fields from `item`.
    fn from_stack_item(&mut self, item: &StackItem) -> Result<()>;

    fn to_stack_item(&self) -> Result<StackItem>;

    fn clone_box(&self) -> Box<dyn Interoperable>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn Interoperable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Fields of a struct or array item, or a format error naming `what`.
pub(crate) fn fields_of(item: &StackItem, what: &str) -> Result<Vec<StackItem>> {
    match item {
        StackItem::Array(array) => Ok(array.to_vec()),
        StackItem::Struct(st) => Ok(st.to_vec()),
        other => Err(crate::Error::format(format!(
            "{what} expects a struct, found {}",
            other.item_type().name()
        ))),
    }
}
