//! The StdLib native contract: stateless codecs and string helpers.

use super::contract_method_metadata::{CallContext, ContractMethodMetadata};
use super::native_contract::{NativeCallContext, NativeContract, NativeContractBase};
use crate::binary_serializer::BinarySerializer;
use crate::contract_task::ContractTask;
use crate::interop::{Arguments, InteropParameterType as Type, InteropValue, MaxLengthValidator};
use crate::json_serializer::JsonSerializer;
use crate::{Error, Result};
use base64::Engine as _;
use neo_vm::{CallFlags, StackItem};
use num_bigint::{BigInt, Sign};
use num_traits::One;
use std::cmp::Ordering;

/// Longest byte or string input the codecs accept.
pub const MAX_INPUT_LENGTH: usize = 1024;

/// Maximum nesting of `jsonDeserialize` input.
const MAX_JSON_DEPTH: usize = 10;

#[derive(Debug)]
pub struct StdLib {
    base: NativeContractBase,
}

impl StdLib {
    pub const NAME: &'static str = "StdLib";

    pub(super) fn new(id: i32) -> Result<Self> {
        let method = |name: &'static str, cpu_fee: i64| {
            ContractMethodMetadata::new(name, CallContext::None)
                .cpu_fee(cpu_fee)
                .flags(CallFlags::NONE)
        };
        let engine_method = |name: &'static str, cpu_fee: i64| {
            ContractMethodMetadata::new(name, CallContext::Engine)
                .cpu_fee(cpu_fee)
                .flags(CallFlags::NONE)
        };
        let capped = MaxLengthValidator(MAX_INPUT_LENGTH);
        let memory_search = || {
            method("memorySearch", 1 << 6)
                .validated_param("mem", Type::ByteArray, capped)
                .validated_param("value", Type::ByteArray, capped)
                .returns(Type::I32)
        };
        let methods = vec![
            engine_method("serialize", 1 << 12)
                .param("item", Type::Any)
                .returns(Type::ByteArray),
            engine_method("deserialize", 1 << 14)
                .param("data", Type::ByteArray)
                .returns(Type::Any),
            engine_method("jsonSerialize", 1 << 12)
                .param("item", Type::Any)
                .returns(Type::ByteArray),
            engine_method("jsonDeserialize", 1 << 14)
                .param("json", Type::ByteArray)
                .returns(Type::Any),
            method("itoa", 1 << 12)
                .param("value", Type::BigInteger)
                .returns(Type::String),
            method("itoa", 1 << 12)
                .param("value", Type::BigInteger)
                .param("base", Type::I32)
                .returns(Type::String),
            method("atoi", 1 << 6)
                .validated_param("value", Type::String, capped)
                .returns(Type::BigInteger),
            method("atoi", 1 << 6)
                .validated_param("value", Type::String, capped)
                .param("base", Type::I32)
                .returns(Type::BigInteger),
            method("base64Encode", 1 << 5)
                .validated_param("data", Type::ByteArray, capped)
                .returns(Type::String),
            method("base64Decode", 1 << 5)
                .validated_param("s", Type::String, capped)
                .returns(Type::ByteArray),
            method("base58Encode", 1 << 13)
                .validated_param("data", Type::ByteArray, capped)
                .returns(Type::String),
            method("base58Decode", 1 << 10)
                .validated_param("s", Type::String, capped)
                .returns(Type::ByteArray),
            method("base58CheckEncode", 1 << 16)
                .validated_param("data", Type::ByteArray, capped)
                .returns(Type::String),
            method("base58CheckDecode", 1 << 16)
                .validated_param("s", Type::String, capped)
                .returns(Type::ByteArray),
            method("memoryCompare", 1 << 5)
                .validated_param("str1", Type::ByteArray, capped)
                .validated_param("str2", Type::ByteArray, capped)
                .returns(Type::I32),
            memory_search(),
            memory_search().param("start", Type::I32),
            memory_search()
                .param("start", Type::I32)
                .param("backward", Type::Boolean),
            method("stringSplit", 1 << 8)
                .validated_param("str", Type::String, capped)
                .param("separator", Type::String)
                .returns(Type::Array),
            method("stringSplit", 1 << 8)
                .validated_param("str", Type::String, capped)
                .param("separator", Type::String)
                .param("removeEmptyEntries", Type::Boolean)
                .returns(Type::Array),
            method("strLen", 1 << 8)
                .validated_param("str", Type::String, capped)
                .returns(Type::I32),
        ];
        Ok(Self {
            base: NativeContractBase::new(id, Self::NAME, methods, Vec::new())?,
        })
    }
}

fn bytes_arg(args: &mut Arguments, name: &str) -> Result<Vec<u8>> {
    args.next()?
        .into_bytes()?
        .ok_or_else(|| Error::argument(format!("{name} can't be null")))
}

fn string_arg(args: &mut Arguments, name: &str) -> Result<String> {
    args.next()?
        .into_string()?
        .ok_or_else(|| Error::argument(format!("{name} can't be null")))
}

fn base_arg(args: &mut Arguments) -> Result<i32> {
    if args.is_empty() {
        Ok(10)
    } else {
        args.next()?.into_int()
    }
}

/// Formats `value` in base 10, or in base 16 as the shortest two's
/// complement hex string that keeps the sign.
pub fn itoa(value: &BigInt, base: i32) -> Result<String> {
    match base {
        10 => Ok(value.to_string()),
        16 => {
            let mut nibbles = 1usize;
            loop {
                let bound = BigInt::from(8) << (4 * (nibbles - 1));
                if *value >= -bound.clone() && *value < bound {
                    break;
                }
                nibbles += 1;
            }
            let modulus = BigInt::one() << (4 * nibbles);
            let mut unsigned = value % &modulus;
            if unsigned.sign() == Sign::Minus {
                unsigned += &modulus;
            }
            Ok(format!(
                "{:0>width$}",
                unsigned.to_str_radix(16),
                width = nibbles
            ))
        }
        _ => Err(Error::argument(format!("base {base} is out of range"))),
    }
}

/// Parses `value` in base 10, with an optional leading sign, or in base 16
/// as two's complement hex.
pub fn atoi(value: &str, base: i32) -> Result<BigInt> {
    let invalid = || Error::format(format!("{value:?} is not a base {base} integer"));
    match base {
        10 => {
            let digits = value
                .strip_prefix('-')
                .or_else(|| value.strip_prefix('+'))
                .unwrap_or(value);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
            Ok(if value.starts_with('-') {
                -magnitude
            } else {
                magnitude
            })
        }
        16 => {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let unsigned = BigInt::parse_bytes(value.as_bytes(), 16).ok_or_else(invalid)?;
            let negative = value
                .chars()
                .next()
                .and_then(|c| c.to_digit(16))
                .map_or(false, |d| d >= 8);
            Ok(if negative {
                unsigned - (BigInt::one() << (4 * value.len()))
            } else {
                unsigned
            })
        }
        _ => Err(Error::argument(format!("base {base} is out of range"))),
    }
}

/// The sign of the lexicographic comparison of `a` and `b`.
pub fn memory_compare(a: &[u8], b: &[u8]) -> i32 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Finds `value` in `mem`. A forward search looks at `mem[start..]`, a
/// backward one at `mem[..start]` and returns the last match. Returns -1
/// when nothing matches.
pub fn memory_search(mem: &[u8], value: &[u8], start: i32, backward: bool) -> Result<i32> {
    let start = usize::try_from(start)
        .ok()
        .filter(|start| *start <= mem.len())
        .ok_or_else(|| Error::argument(format!("start {start} is out of range")))?;
    let found = if backward {
        let window = &mem[..start];
        if value.is_empty() {
            Some(window.len())
        } else {
            window.windows(value.len()).rposition(|w| w == value)
        }
    } else {
        let window = &mem[start..];
        if value.is_empty() {
            Some(start)
        } else {
            window
                .windows(value.len())
                .position(|w| w == value)
                .map(|index| index + start)
        }
    };
    match found {
        Some(index) => i32::try_from(index).map_err(|_| Error::argument("index out of range")),
        None => Ok(-1),
    }
}

/// Splits `value` at every `separator`. An empty separator leaves the
/// string whole.
pub fn string_split(value: &str, separator: &str, remove_empty_entries: bool) -> Vec<String> {
    let parts: Vec<&str> = if separator.is_empty() {
        vec![value]
    } else {
        value.split(separator).collect()
    };
    parts
        .into_iter()
        .filter(|part| !remove_empty_entries || !part.is_empty())
        .map(str::to_string)
        .collect()
}

impl NativeContract for StdLib {
    fn base(&self) -> &NativeContractBase {
        &self.base
    }

    fn invoke(
        &self,
        context: NativeCallContext<'_>,
        method: &str,
        mut args: Arguments,
    ) -> Result<ContractTask> {
        let value: InteropValue = match method {
            "serialize" => {
                let engine = context.engine()?;
                let item = args.next()?.into_item()?;
                BinarySerializer::serialize(&item, engine.limits())?.into()
            }
            "deserialize" => {
                let engine = context.engine()?;
                let data = bytes_arg(&mut args, "data")?;
                BinarySerializer::deserialize(&data, engine.limits())?.into()
            }
            "jsonSerialize" => {
                let engine = context.engine()?;
                let item = args.next()?.into_item()?;
                JsonSerializer::serialize_to_byte_array(&item, engine.limits().max_item_size as usize)?
                    .into()
            }
            "jsonDeserialize" => {
                let engine = context.engine()?;
                let json = bytes_arg(&mut args, "json")?;
                let parsed = JsonSerializer::parse(&json, MAX_JSON_DEPTH)?;
                JsonSerializer::deserialize(&parsed, engine.limits())?.into()
            }
            "itoa" => {
                let value = args.next()?.into_integer()?;
                itoa(&value, base_arg(&mut args)?)?.into()
            }
            "atoi" => {
                let value = string_arg(&mut args, "value")?;
                atoi(&value, base_arg(&mut args)?)?.into()
            }
            "base64Encode" => {
                let data = bytes_arg(&mut args, "data")?;
                base64::engine::general_purpose::STANDARD.encode(data).into()
            }
            "base64Decode" => {
                let s: String = string_arg(&mut args, "s")?
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| Error::format(format!("invalid base64: {e}")))?
                    .into()
            }
            "base58Encode" => bs58::encode(bytes_arg(&mut args, "data")?).into_string().into(),
            "base58Decode" => bs58::decode(string_arg(&mut args, "s")?)
                .into_vec()
                .map_err(|e| Error::format(format!("invalid base58: {e}")))?
                .into(),
            "base58CheckEncode" => bs58::encode(bytes_arg(&mut args, "data")?)
                .with_check()
                .into_string()
                .into(),
            "base58CheckDecode" => bs58::decode(string_arg(&mut args, "s")?)
                .with_check(None)
                .into_vec()
                .map_err(|e| Error::format(format!("invalid base58check: {e}")))?
                .into(),
            "memoryCompare" => {
                let a = bytes_arg(&mut args, "str1")?;
                let b = bytes_arg(&mut args, "str2")?;
                memory_compare(&a, &b).into()
            }
            "memorySearch" => {
                let mem = bytes_arg(&mut args, "mem")?;
                let value = bytes_arg(&mut args, "value")?;
                let start = if args.is_empty() { 0 } else { args.next()?.into_int()? };
                let backward = if args.is_empty() { false } else { args.next()?.into_bool()? };
                memory_search(&mem, &value, start, backward)?.into()
            }
            "stringSplit" => {
                let value = string_arg(&mut args, "str")?;
                let separator = string_arg(&mut args, "separator")?;
                let remove_empty = if args.is_empty() { false } else { args.next()?.into_bool()? };
                let parts = string_split(&value, &separator, remove_empty)
                    .into_iter()
                    .map(StackItem::from)
                    .collect();
                StackItem::new_array(parts).into()
            }
            "strLen" => {
                let value = string_arg(&mut args, "str")?;
                i32::try_from(value.chars().count())
                    .map_err(|_| Error::argument("string too long"))?
                    .into()
            }
            _ => {
                return Err(Error::not_supported(format!(
                    "method {method} of {} is not implemented",
                    Self::NAME
                )))
            }
        };
        Ok(ContractTask::from_result(value))
    }
}
