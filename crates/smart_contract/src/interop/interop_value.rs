//! Host-side values passed to and returned from interop handlers.

use crate::contract_state::ContractState;
use crate::{Error, Interoperable, Result};
use neo_core::UInt160;
use neo_vm::{InteropInterface, StackItem};
use num_bigint::BigInt;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A converted interop argument or a handler's return value.
pub enum InteropValue {
    /// Nothing is pushed back onto the stack.
    Void,
    Null,
    Boolean(bool),
    Integer(BigInt),
    Bytes(Vec<u8>),
    String(String),
    Hash160(UInt160),
    /// An unconverted stack item.
    Item(StackItem),
    Interface(Rc<dyn InteropInterface>),
    Interoperable(Box<dyn Interoperable>),
}

impl fmt::Debug for InteropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteropValue::Void => f.write_str("Void"),
            InteropValue::Null => f.write_str("Null"),
            InteropValue::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            InteropValue::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            InteropValue::Bytes(v) => f.debug_tuple("Bytes").field(&hex::encode(v)).finish(),
            InteropValue::String(v) => f.debug_tuple("String").field(v).finish(),
            InteropValue::Hash160(v) => f.debug_tuple("Hash160").field(v).finish(),
            InteropValue::Item(v) => f.debug_tuple("Item").field(v).finish(),
            InteropValue::Interface(v) => f.debug_tuple("Interface").field(v).finish(),
            InteropValue::Interoperable(v) => f.debug_tuple("Interoperable").field(v).finish(),
        }
    }
}

impl InteropValue {
    pub fn interface(value: impl InteropInterface + 'static) -> Self {
        InteropValue::Interface(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        match self {
            InteropValue::Null => true,
            InteropValue::Item(item) => item.is_null(),
            _ => false,
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::argument(format!("expected {expected}, found {self:?}"))
    }

    /// The stack form of the value. `Void` becomes `Null`.
    pub fn into_stack_item(self) -> Result<StackItem> {
        Ok(match self {
            InteropValue::Void | InteropValue::Null => StackItem::Null,
            InteropValue::Boolean(v) => StackItem::from(v),
            InteropValue::Integer(v) => StackItem::from(v),
            InteropValue::Bytes(v) => StackItem::from(v),
            InteropValue::String(v) => StackItem::from(v),
            InteropValue::Hash160(v) => StackItem::from(v.to_array().to_vec()),
            InteropValue::Item(item) => item,
            InteropValue::Interface(v) => StackItem::new_interop(v),
            InteropValue::Interoperable(v) => v.to_stack_item()?,
        })
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            InteropValue::Boolean(v) => Ok(v),
            InteropValue::Item(item) => Ok(item.get_boolean()?),
            other => Err(other.unexpected("a boolean")),
        }
    }

    pub fn into_integer(self) -> Result<BigInt> {
        match self {
            InteropValue::Integer(v) => Ok(v),
            InteropValue::Item(item) => Ok(item.get_integer()?),
            other => Err(other.unexpected("an integer")),
        }
    }

    /// The integer value narrowed to `T`.
    pub fn into_int<T: TryFrom<BigInt>>(self) -> Result<T> {
        let value = self.into_integer()?;
        T::try_from(value.clone()).map_err(|_| {
            Error::argument(format!(
                "{value} is out of range for {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// The byte value, or `None` for null.
    pub fn into_bytes(self) -> Result<Option<Vec<u8>>> {
        match self {
            InteropValue::Null => Ok(None),
            InteropValue::Bytes(v) => Ok(Some(v)),
            InteropValue::String(v) => Ok(Some(v.into_bytes())),
            InteropValue::Item(item) if item.is_null() => Ok(None),
            InteropValue::Item(item) => Ok(Some(item.get_span()?)),
            other => Err(other.unexpected("a byte array")),
        }
    }

    /// The string value, or `None` for null.
    pub fn into_string(self) -> Result<Option<String>> {
        match self {
            InteropValue::Null => Ok(None),
            InteropValue::String(v) => Ok(Some(v)),
            InteropValue::Item(item) if item.is_null() => Ok(None),
            InteropValue::Item(item) => Ok(Some(item.get_string()?)),
            other => Err(other.unexpected("a string")),
        }
    }

    /// The hash value, or `None` for null.
    pub fn into_hash160(self) -> Result<Option<UInt160>> {
        match self {
            InteropValue::Null => Ok(None),
            InteropValue::Hash160(v) => Ok(Some(v)),
            InteropValue::Bytes(v) => Ok(Some(UInt160::from_bytes(&v)?)),
            other => Err(other.unexpected("a Hash160")),
        }
    }

    pub fn into_item(self) -> Result<StackItem> {
        match self {
            InteropValue::Void => Err(Error::argument("expected a value, found Void")),
            other => other.into_stack_item(),
        }
    }
}

impl From<bool> for InteropValue {
    fn from(value: bool) -> Self {
        InteropValue::Boolean(value)
    }
}

macro_rules! integer_value_from {
    ($($t:ty),*) => {
        $(impl From<$t> for InteropValue {
            fn from(value: $t) -> Self {
                InteropValue::Integer(BigInt::from(value))
            }
        })*
    };
}

integer_value_from!(i8, u8, i16, u16, i32, u32, i64, u64);

impl From<BigInt> for InteropValue {
    fn from(value: BigInt) -> Self {
        InteropValue::Integer(value)
    }
}

impl From<Vec<u8>> for InteropValue {
    fn from(value: Vec<u8>) -> Self {
        InteropValue::Bytes(value)
    }
}

impl From<String> for InteropValue {
    fn from(value: String) -> Self {
        InteropValue::String(value)
    }
}

impl From<&str> for InteropValue {
    fn from(value: &str) -> Self {
        InteropValue::String(value.to_string())
    }
}

impl From<UInt160> for InteropValue {
    fn from(value: UInt160) -> Self {
        InteropValue::Hash160(value)
    }
}

impl From<StackItem> for InteropValue {
    fn from(value: StackItem) -> Self {
        InteropValue::Item(value)
    }
}

impl From<ContractState> for InteropValue {
    fn from(value: ContractState) -> Self {
        InteropValue::Interoperable(Box::new(value))
    }
}

impl<T: Into<InteropValue>> From<Option<T>> for InteropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(InteropValue::Null, Into::into)
    }
}

/// The converted arguments of one interop or native call, in declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    values: VecDeque<InteropValue>,
}

impl Arguments {
    pub fn new(values: Vec<InteropValue>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the next argument.
    pub fn next(&mut self) -> Result<InteropValue> {
        self.values
            .pop_front()
            .ok_or_else(|| Error::argument("missing argument"))
    }
}

impl From<Vec<InteropValue>> for Arguments {
    fn from(values: Vec<InteropValue>) -> Self {
        Self::new(values)
    }
}
