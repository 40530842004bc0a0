//! Declared parameters of interop services and native methods.

use super::InteropValue;
use crate::manifest::ContractParameterType;
use crate::{Error, Result};
use neo_core::UInt160;
use neo_vm::StackItem;
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;

/// The host type a stack argument is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteropParameterType {
    /// The stack item itself.
    Any,
    Boolean,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    BigInteger,
    ByteArray,
    String,
    Hash160,
    Array,
    Map,
    InteropInterface,
    /// Return type of methods that push nothing.
    Void,
}

impl InteropParameterType {
    /// The ABI type a manifest declares for this host type.
    pub fn to_contract_parameter_type(self) -> ContractParameterType {
        match self {
            InteropParameterType::Any => ContractParameterType::Any,
            InteropParameterType::Boolean => ContractParameterType::Boolean,
            InteropParameterType::I8
            | InteropParameterType::U8
            | InteropParameterType::I16
            | InteropParameterType::U16
            | InteropParameterType::I32
            | InteropParameterType::U32
            | InteropParameterType::I64
            | InteropParameterType::U64
            | InteropParameterType::BigInteger => ContractParameterType::Integer,
            InteropParameterType::ByteArray => ContractParameterType::ByteArray,
            InteropParameterType::String => ContractParameterType::String,
            InteropParameterType::Hash160 => ContractParameterType::Hash160,
            InteropParameterType::Array => ContractParameterType::Array,
            InteropParameterType::Map => ContractParameterType::Map,
            InteropParameterType::InteropInterface => ContractParameterType::InteropInterface,
            InteropParameterType::Void => ContractParameterType::Void,
        }
    }

    fn integer_range(self) -> Option<(BigInt, BigInt)> {
        let range = |min: i128, max: i128| Some((BigInt::from(min), BigInt::from(max)));
        match self {
            InteropParameterType::I8 => range(i8::MIN.into(), i8::MAX.into()),
            InteropParameterType::U8 => range(0, u8::MAX.into()),
            InteropParameterType::I16 => range(i16::MIN.into(), i16::MAX.into()),
            InteropParameterType::U16 => range(0, u16::MAX.into()),
            InteropParameterType::I32 => range(i32::MIN.into(), i32::MAX.into()),
            InteropParameterType::U32 => range(0, u32::MAX.into()),
            InteropParameterType::I64 => range(i64::MIN.into(), i64::MAX.into()),
            InteropParameterType::U64 => range(0, u64::MAX.into()),
            _ => None,
        }
    }

    /// Converts a stack argument to this host type.
    ///
    /// Byte arrays, strings and hashes accept `Null`. Integers are checked
    /// against the range of the declared width.
    pub fn convert(self, item: &StackItem) -> Result<InteropValue> {
        let value = match self {
            InteropParameterType::Any => InteropValue::Item(item.clone()),
            InteropParameterType::Boolean => InteropValue::Boolean(item.get_boolean()?),
            InteropParameterType::BigInteger => InteropValue::Integer(item.get_integer()?),
            InteropParameterType::I8
            | InteropParameterType::U8
            | InteropParameterType::I16
            | InteropParameterType::U16
            | InteropParameterType::I32
            | InteropParameterType::U32
            | InteropParameterType::I64
            | InteropParameterType::U64 => {
                let value = item.get_integer()?;
                if let Some((min, max)) = self.integer_range() {
                    if value < min || value > max {
                        return Err(Error::argument(format!(
                            "{value} is out of range for {self:?}"
                        )));
                    }
                }
                InteropValue::Integer(value)
            }
            _ if item.is_null()
                && matches!(
                    self,
                    InteropParameterType::ByteArray
                        | InteropParameterType::String
                        | InteropParameterType::Hash160
                        | InteropParameterType::InteropInterface
                ) =>
            {
                InteropValue::Null
            }
            InteropParameterType::ByteArray => InteropValue::Bytes(item.get_span()?),
            InteropParameterType::String => InteropValue::String(item.get_string()?),
            InteropParameterType::Hash160 => {
                let bytes = item.get_span()?;
                if bytes.len() != UInt160::LENGTH {
                    return Err(Error::argument(format!(
                        "a Hash160 is {} bytes, found {}",
                        UInt160::LENGTH,
                        bytes.len()
                    )));
                }
                InteropValue::Hash160(UInt160::from_bytes(&bytes)?)
            }
            InteropParameterType::Array => match item {
                StackItem::Array(_) | StackItem::Struct(_) => InteropValue::Item(item.clone()),
                other => {
                    return Err(Error::argument(format!(
                        "expected an array, found {}",
                        other.item_type().name()
                    )))
                }
            },
            InteropParameterType::Map => match item {
                StackItem::Map(_) => InteropValue::Item(item.clone()),
                other => {
                    return Err(Error::argument(format!(
                        "expected a map, found {}",
                        other.item_type().name()
                    )))
                }
            },
            InteropParameterType::InteropInterface => match item {
                StackItem::InteropInterface(_) => InteropValue::Item(item.clone()),
                other => {
                    return Err(Error::argument(format!(
                        "expected an interop interface, found {}",
                        other.item_type().name()
                    )))
                }
            },
            InteropParameterType::Void => {
                return Err(Error::argument("a parameter can't be Void"));
            }
        };
        Ok(value)
    }
}

/// A check applied to a stack argument before it is converted.
pub trait ParameterValidator: fmt::Debug + Send + Sync {
    fn validate(&self, item: &StackItem) -> Result<()>;
}

/// Rejects byte and string arguments longer than the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLengthValidator(pub usize);

impl ParameterValidator for MaxLengthValidator {
    fn validate(&self, item: &StackItem) -> Result<()> {
        if item.is_null() {
            return Ok(());
        }
        let len = item.get_span()?.len();
        if len > self.0 {
            return Err(Error::argument(format!(
                "input of {len} bytes exceeds the maximum length {}",
                self.0
            )));
        }
        Ok(())
    }
}

/// A named, typed parameter with its validators.
#[derive(Debug, Clone)]
pub struct InteropParameterDescriptor {
    pub name: &'static str,
    pub parameter_type: InteropParameterType,
    validators: Vec<Arc<dyn ParameterValidator>>,
}

impl InteropParameterDescriptor {
    pub fn new(name: &'static str, parameter_type: InteropParameterType) -> Self {
        Self {
            name,
            parameter_type,
            validators: Vec::new(),
        }
    }

    pub fn with_validator(mut self, validator: impl ParameterValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn validators(&self) -> &[Arc<dyn ParameterValidator>] {
        &self.validators
    }

    /// Runs every validator, then converts `item`.
    pub fn convert(&self, item: &StackItem) -> Result<InteropValue> {
        for validator in &self.validators {
            validator.validate(item)?;
        }
        self.parameter_type.convert(item)
    }
}
