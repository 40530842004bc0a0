//! Stack items: the runtime values understood by the interpreter.

mod compound;
mod interop_interface;
mod map;
mod stack_item_type;

pub use compound::{Array, Struct};
pub use interop_interface::InteropInterface;
pub use map::Map;
pub use stack_item_type::StackItemType;

use crate::{VmError, VmResult};
use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::HashMap;
use std::rc::Rc;

/// The maximum size of an integer in bytes.
pub const MAX_INTEGER_SIZE: usize = 32;

/// Minimal two's-complement little-endian encoding; zero encodes as no bytes.
pub fn integer_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

/// Decodes a two's-complement little-endian integer of at most 32 bytes.
pub fn integer_from_bytes(bytes: &[u8]) -> VmResult<BigInt> {
    if bytes.len() > MAX_INTEGER_SIZE {
        return Err(VmError::SizeExceeded {
            size: bytes.len(),
            limit: MAX_INTEGER_SIZE,
        });
    }
    if bytes.is_empty() {
        return Ok(BigInt::zero());
    }
    Ok(BigInt::from_signed_bytes_le(bytes))
}

/// A runtime value on the evaluation stack.
#[derive(Debug, Clone)]
pub enum StackItem {
    Null,
    Boolean(bool),
    Integer(BigInt),
    ByteString(Vec<u8>),
    Buffer(Vec<u8>),
    Array(Array),
    Struct(Struct),
    Map(Map),
    Pointer(usize),
    InteropInterface(Rc<dyn InteropInterface>),
}

impl StackItem {
    pub fn item_type(&self) -> StackItemType {
        match self {
            StackItem::Null => StackItemType::Any,
            StackItem::Boolean(_) => StackItemType::Boolean,
            StackItem::Integer(_) => StackItemType::Integer,
            StackItem::ByteString(_) => StackItemType::ByteString,
            StackItem::Buffer(_) => StackItemType::Buffer,
            StackItem::Array(_) => StackItemType::Array,
            StackItem::Struct(_) => StackItemType::Struct,
            StackItem::Map(_) => StackItemType::Map,
            StackItem::Pointer(_) => StackItemType::Pointer,
            StackItem::InteropInterface(_) => StackItemType::InteropInterface,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StackItem::Null)
    }

    pub fn new_array(items: Vec<StackItem>) -> Self {
        StackItem::Array(Array::new(items))
    }

    pub fn new_struct(items: Vec<StackItem>) -> Self {
        StackItem::Struct(Struct::new(items))
    }

    pub fn new_interop(value: Rc<dyn InteropInterface>) -> Self {
        StackItem::InteropInterface(value)
    }

    fn invalid_cast(&self, expected: &str) -> VmError {
        VmError::invalid_type(expected, self.item_type().name())
    }

    pub fn get_boolean(&self) -> VmResult<bool> {
        match self {
            StackItem::Null => Ok(false),
            StackItem::Boolean(b) => Ok(*b),
            StackItem::Integer(i) => Ok(!i.is_zero()),
            StackItem::ByteString(bytes) => {
                if bytes.len() > MAX_INTEGER_SIZE {
                    return Err(self.invalid_cast("Boolean"));
                }
                Ok(bytes.iter().any(|b| *b != 0))
            }
            _ => Ok(true),
        }
    }

    pub fn get_integer(&self) -> VmResult<BigInt> {
        match self {
            StackItem::Boolean(b) => Ok(BigInt::from(*b as u8)),
            StackItem::Integer(i) => Ok(i.clone()),
            StackItem::ByteString(bytes) => integer_from_bytes(bytes),
            _ => Err(self.invalid_cast("Integer")),
        }
    }

    /// The byte form of a primitive or buffer.
    pub fn get_span(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::Boolean(b) => Ok(vec![*b as u8]),
            StackItem::Integer(i) => Ok(integer_to_bytes(i)),
            StackItem::ByteString(bytes) | StackItem::Buffer(bytes) => Ok(bytes.clone()),
            _ => Err(self.invalid_cast("ByteString")),
        }
    }

    /// The byte form decoded as strict UTF-8.
    pub fn get_string(&self) -> VmResult<String> {
        String::from_utf8(self.get_span()?)
            .map_err(|_| VmError::invalid_operation("invalid UTF-8 string"))
    }

    pub fn as_interface<T: 'static>(&self) -> VmResult<&T> {
        match self {
            StackItem::InteropInterface(value) => value
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| VmError::invalid_type(std::any::type_name::<T>(), value.interface_type())),
            _ => Err(self.invalid_cast("InteropInterface")),
        }
    }

    /// Equality used for map keys: same primitive type and same value.
    pub fn primitive_eq(&self, other: &StackItem) -> bool {
        match (self, other) {
            (StackItem::Boolean(a), StackItem::Boolean(b)) => a == b,
            (StackItem::Integer(a), StackItem::Integer(b)) => a == b,
            (StackItem::ByteString(a), StackItem::ByteString(b)) => a == b,
            _ => false,
        }
    }

    /// Copies containers recursively, preserving sharing between them.
    pub fn deep_copy(&self) -> StackItem {
        let mut copied = HashMap::new();
        self.deep_copy_with(&mut copied)
    }

    fn deep_copy_with(&self, copied: &mut HashMap<usize, StackItem>) -> StackItem {
        match self {
            StackItem::Array(array) => {
                if let Some(existing) = copied.get(&array.id()) {
                    return existing.clone();
                }
                let result = Array::new(Vec::with_capacity(array.len()));
                copied.insert(array.id(), StackItem::Array(result.clone()));
                for item in array.to_vec() {
                    result.push(item.deep_copy_with(copied));
                }
                StackItem::Array(result)
            }
            StackItem::Struct(st) => {
                if let Some(existing) = copied.get(&st.id()) {
                    return existing.clone();
                }
                let result = Struct::new(Vec::with_capacity(st.len()));
                copied.insert(st.id(), StackItem::Struct(result.clone()));
                for item in st.to_vec() {
                    result.push(item.deep_copy_with(copied));
                }
                StackItem::Struct(result)
            }
            StackItem::Map(map) => {
                if let Some(existing) = copied.get(&map.id()) {
                    return existing.clone();
                }
                let result = Map::new();
                copied.insert(map.id(), StackItem::Map(result.clone()));
                let entries = map.entries().clone();
                for (key, value) in entries {
                    // Keys were validated on the way into the source map.
                    let _ = result.insert(key, value.deep_copy_with(copied));
                }
                StackItem::Map(result)
            }
            other => other.clone(),
        }
    }
}

impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StackItem::Null, StackItem::Null) => true,
            (StackItem::Boolean(a), StackItem::Boolean(b)) => a == b,
            (StackItem::Integer(a), StackItem::Integer(b)) => a == b,
            (StackItem::ByteString(a), StackItem::ByteString(b)) => a == b,
            (StackItem::Buffer(a), StackItem::Buffer(b)) => a == b,
            (StackItem::Array(a), StackItem::Array(b)) => a == b,
            (StackItem::Struct(a), StackItem::Struct(b)) => a == b,
            (StackItem::Map(a), StackItem::Map(b)) => a == b,
            (StackItem::Pointer(a), StackItem::Pointer(b)) => a == b,
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        StackItem::Boolean(value)
    }
}

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(impl From<$t> for StackItem {
            fn from(value: $t) -> Self {
                StackItem::Integer(BigInt::from(value))
            }
        })*
    };
}

integer_from!(i8, u8, i16, u16, i32, u32, i64, u64);

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        StackItem::Integer(value)
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        StackItem::ByteString(value)
    }
}

impl From<&[u8]> for StackItem {
    fn from(value: &[u8]) -> Self {
        StackItem::ByteString(value.to_vec())
    }
}

impl From<&str> for StackItem {
    fn from(value: &str) -> Self {
        StackItem::ByteString(value.as_bytes().to_vec())
    }
}

impl From<String> for StackItem {
    fn from(value: String) -> Self {
        StackItem::ByteString(value.into_bytes())
    }
}

impl From<Array> for StackItem {
    fn from(value: Array) -> Self {
        StackItem::Array(value)
    }
}

impl From<Struct> for StackItem {
    fn from(value: Struct) -> Self {
        StackItem::Struct(value)
    }
}

impl From<Map> for StackItem {
    fn from(value: Map) -> Self {
        StackItem::Map(value)
    }
}
