//! Array and Struct stack items.
//!
//! Both are shared, mutable, ordered lists. Cloning a handle shares the
//! underlying list; [`Array::id`] identifies the list itself and is what
//! graph-aware code uses to detect repeated containers.

use super::StackItem;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

macro_rules! list_item {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name {
            items: Rc<RefCell<Vec<StackItem>>>,
        }

        impl $name {
            pub fn new(items: Vec<StackItem>) -> Self {
                Self {
                    items: Rc::new(RefCell::new(items)),
                }
            }

            /// Identity of the underlying list.
            pub fn id(&self) -> usize {
                Rc::as_ptr(&self.items) as usize
            }

            pub fn len(&self) -> usize {
                self.items.borrow().len()
            }

            pub fn is_empty(&self) -> bool {
                self.items.borrow().is_empty()
            }

            pub fn get(&self, index: usize) -> Option<StackItem> {
                self.items.borrow().get(index).cloned()
            }

            pub fn push(&self, item: StackItem) {
                self.items.borrow_mut().push(item);
            }

            pub fn set(&self, index: usize, item: StackItem) -> bool {
                match self.items.borrow_mut().get_mut(index) {
                    Some(slot) => {
                        *slot = item;
                        true
                    }
                    None => false,
                }
            }

            pub fn items(&self) -> Ref<'_, Vec<StackItem>> {
                self.items.borrow()
            }

            /// A snapshot of the current children.
            pub fn to_vec(&self) -> Vec<StackItem> {
                self.items.borrow().clone()
            }

            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.items, &other.items)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other) || *self.items.borrow() == *other.items.borrow()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&*self.items.borrow())
                    .finish()
            }
        }

        impl From<Vec<StackItem>> for $name {
            fn from(items: Vec<StackItem>) -> Self {
                Self::new(items)
            }
        }
    };
}

list_item!(
    /// An ordered list with reference semantics.
    Array
);

list_item!(
    /// An ordered list with value semantics inside the VM.
    Struct
);
