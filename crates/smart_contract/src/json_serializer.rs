//! JSON encoding of stack items.
//!
//! Arrays and structs become JSON arrays, maps with byte string keys become
//! objects, byte strings and buffers become strings. Integers must fit the
//! interval of exactly representable doubles.

use crate::{Error, Result};
use neo_vm::{ExecutionEngineLimits, Map, StackItem};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Zero};
use serde_json::Value;
use std::fmt::Write as _;

/// The largest integer magnitude a JSON number may carry.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// The smallest integer a JSON number may carry.
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// JSON serializer helpers for VM stack items.
pub struct JsonSerializer;

enum Token {
    Item(StackItem),
    EndArray,
    EndObject,
    PropertyName(StackItem),
}

enum Visited {
    Leaf(Value),
    Container(ValueFrame),
}

/// A container whose children are being converted to JSON.
enum ValueFrame {
    Array {
        id: usize,
        items: std::vec::IntoIter<StackItem>,
        values: Vec<Value>,
    },
    Object {
        id: usize,
        entries: std::vec::IntoIter<(String, StackItem)>,
        key: Option<String>,
        object: serde_json::Map<String, Value>,
    },
}

impl ValueFrame {
    fn id(&self) -> usize {
        match self {
            ValueFrame::Array { id, .. } | ValueFrame::Object { id, .. } => *id,
        }
    }

    fn next_child(&mut self) -> Option<StackItem> {
        match self {
            ValueFrame::Array { items, .. } => items.next(),
            ValueFrame::Object { entries, key, .. } => entries.next().map(|(name, value)| {
                *key = Some(name);
                value
            }),
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            ValueFrame::Array { values, .. } => values.push(value),
            ValueFrame::Object { key, object, .. } => {
                if let Some(key) = key.take() {
                    object.insert(key, value);
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            ValueFrame::Array { values, .. } => Value::Array(values),
            ValueFrame::Object { object, .. } => Value::Object(object),
        }
    }
}

/// A JSON container whose children are being converted to stack items.
enum ItemFrame<'a> {
    Array {
        values: std::slice::Iter<'a, Value>,
        items: Vec<StackItem>,
    },
    Object {
        entries: serde_json::map::Iter<'a>,
        key: Option<&'a str>,
        map: Map,
    },
}

impl<'a> ItemFrame<'a> {
    /// The next child to convert. Each object property costs one unit of
    /// `budget` on top of its value.
    fn next_child(&mut self, budget: &mut usize) -> Result<Option<&'a Value>> {
        match self {
            ItemFrame::Array { values, .. } => Ok(values.next()),
            ItemFrame::Object { entries, key, .. } => match entries.next() {
                Some((name, value)) => {
                    JsonSerializer::take_budget(budget)?;
                    *key = Some(name.as_str());
                    Ok(Some(value))
                }
                None => Ok(None),
            },
        }
    }

    fn push(&mut self, item: StackItem) -> Result<()> {
        match self {
            ItemFrame::Array { items, .. } => items.push(item),
            ItemFrame::Object { key, map, .. } => {
                if let Some(key) = key.take() {
                    map.insert(StackItem::from(key), item)?;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> StackItem {
        match self {
            ItemFrame::Array { items, .. } => StackItem::new_array(items),
            ItemFrame::Object { map, .. } => StackItem::Map(map),
        }
    }
}

fn circular_reference() -> Error {
    Error::format("circular reference in JSON conversion")
}

fn check_safe_integer(value: &BigInt) -> Result<i64> {
    let min = BigInt::from(MIN_SAFE_INTEGER);
    let max = BigInt::from(MAX_SAFE_INTEGER);
    if *value < min || *value > max {
        return Err(Error::format(format!(
            "integer {value} is outside the JSON safe range"
        )));
    }
    i64::try_from(value).map_err(|_| Error::format("integer is outside the JSON safe range"))
}

/// Appends `text` as a JSON string literal.
///
/// Quotes, HTML-significant characters and everything outside printable
/// ASCII are written as `\uXXXX` escapes (surrogate pairs above the BMP).
fn write_json_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '"' | '&' | '\'' | '+' | '<' | '>' | '`' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
        }
    }
    out.push('"');
}

impl JsonSerializer {
    /// Converts a stack item to a JSON value, visiting at most `max_items` items.
    ///
    /// A container that holds itself, directly or through its children, is
    /// rejected. The same container may still appear at several places.
    pub fn serialize(item: &StackItem, max_items: usize) -> Result<Value> {
        let mut budget = max_items;
        let mut frames: Vec<ValueFrame> = Vec::new();
        let mut next = Some(item.clone());
        let mut done: Option<Value> = None;
        loop {
            if let Some(item) = next.take() {
                match Self::visit(&item, &mut budget, &frames)? {
                    Visited::Leaf(value) => done = Some(value),
                    Visited::Container(frame) => frames.push(frame),
                }
            }
            let Some(frame) = frames.last_mut() else {
                return done.ok_or_else(|| Error::format("no JSON value produced"));
            };
            if let Some(value) = done.take() {
                frame.push(value);
            }
            match frame.next_child() {
                Some(child) => next = Some(child),
                None => done = frames.pop().map(ValueFrame::finish),
            }
        }
    }

    /// Converts a primitive item, or opens a frame for a container.
    fn visit(
        item: &StackItem,
        budget: &mut usize,
        path: &[ValueFrame],
    ) -> Result<Visited> {
        *budget = budget
            .checked_sub(1)
            .ok_or_else(|| Error::format("item count exceeds limit"))?;
        let on_path = |id: usize| path.iter().any(|frame| frame.id() == id);
        let frame = match item {
            StackItem::Array(array) => {
                if on_path(array.id()) {
                    return Err(circular_reference());
                }
                ValueFrame::Array {
                    id: array.id(),
                    items: array.to_vec().into_iter(),
                    values: Vec::with_capacity(array.len()),
                }
            }
            StackItem::Struct(st) => {
                if on_path(st.id()) {
                    return Err(circular_reference());
                }
                ValueFrame::Array {
                    id: st.id(),
                    items: st.to_vec().into_iter(),
                    values: Vec::with_capacity(st.len()),
                }
            }
            StackItem::Map(map) => {
                if on_path(map.id()) {
                    return Err(circular_reference());
                }
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map.entries().iter() {
                    if !matches!(key, StackItem::ByteString(_)) {
                        return Err(Error::format("JSON object keys must be byte strings"));
                    }
                    entries.push((key.get_string()?, value.clone()));
                }
                ValueFrame::Object {
                    id: map.id(),
                    entries: entries.into_iter(),
                    key: None,
                    object: serde_json::Map::new(),
                }
            }
            StackItem::ByteString(_) | StackItem::Buffer(_) => {
                return Ok(Visited::Leaf(Value::String(item.get_string()?)))
            }
            StackItem::Integer(value) => return Ok(Visited::Leaf(Value::from(check_safe_integer(value)?))),
            StackItem::Boolean(value) => return Ok(Visited::Leaf(Value::Bool(*value))),
            StackItem::Null => return Ok(Visited::Leaf(Value::Null)),
            StackItem::Pointer(_) | StackItem::InteropInterface(_) => {
                return Err(Error::format(format!(
                    "{} cannot be converted to JSON",
                    item.item_type().name()
                )))
            }
        };
        Ok(Visited::Container(frame))
    }

    /// Writes a stack item as compact JSON text.
    ///
    /// The traversal keeps an explicit stack of pending items and closing
    /// markers, and the output size is checked after every token.
    pub fn serialize_to_byte_array(item: &StackItem, max_size: usize) -> Result<Vec<u8>> {
        let mut out = String::new();
        // Whether the next value written at each open nesting level needs a comma.
        let mut needs_comma: Vec<bool> = Vec::new();
        // Identities of the containers currently open.
        let mut path: Vec<usize> = Vec::new();
        let mut stack = vec![Token::Item(item.clone())];

        fn open(path: &mut Vec<usize>, id: usize) -> Result<()> {
            if path.contains(&id) {
                return Err(circular_reference());
            }
            path.push(id);
            Ok(())
        }

        fn begin_value(out: &mut String, needs_comma: &mut [bool]) {
            if let Some(flag) = needs_comma.last_mut() {
                if *flag {
                    out.push(',');
                }
                *flag = true;
            }
        }

        while let Some(token) = stack.pop() {
            match token {
                Token::Item(StackItem::Array(array)) => {
                    open(&mut path, array.id())?;
                    begin_value(&mut out, &mut needs_comma);
                    out.push('[');
                    needs_comma.push(false);
                    stack.push(Token::EndArray);
                    stack.extend(array.items().iter().rev().cloned().map(Token::Item));
                }
                Token::Item(StackItem::Struct(st)) => {
                    open(&mut path, st.id())?;
                    begin_value(&mut out, &mut needs_comma);
                    out.push('[');
                    needs_comma.push(false);
                    stack.push(Token::EndArray);
                    stack.extend(st.items().iter().rev().cloned().map(Token::Item));
                }
                Token::EndArray => {
                    path.pop();
                    needs_comma.pop();
                    out.push(']');
                }
                Token::Item(item @ (StackItem::ByteString(_) | StackItem::Buffer(_))) => {
                    begin_value(&mut out, &mut needs_comma);
                    write_json_string(&mut out, &item.get_string()?);
                }
                Token::Item(StackItem::Integer(value)) => {
                    let value = check_safe_integer(&value)?;
                    begin_value(&mut out, &mut needs_comma);
                    let _ = write!(out, "{value}");
                }
                Token::Item(StackItem::Boolean(value)) => {
                    begin_value(&mut out, &mut needs_comma);
                    out.push_str(if value { "true" } else { "false" });
                }
                Token::Item(StackItem::Map(map)) => {
                    open(&mut path, map.id())?;
                    begin_value(&mut out, &mut needs_comma);
                    out.push('{');
                    needs_comma.push(false);
                    stack.push(Token::EndObject);
                    for (key, value) in map.entries().iter().rev() {
                        if !matches!(key, StackItem::ByteString(_)) {
                            return Err(Error::format("JSON object keys must be byte strings"));
                        }
                        stack.push(Token::Item(value.clone()));
                        stack.push(Token::PropertyName(key.clone()));
                    }
                }
                Token::EndObject => {
                    path.pop();
                    needs_comma.pop();
                    out.push('}');
                }
                Token::PropertyName(key) => {
                    begin_value(&mut out, &mut needs_comma);
                    write_json_string(&mut out, &key.get_string()?);
                    out.push(':');
                    // The value follows the colon without a comma.
                    if let Some(flag) = needs_comma.last_mut() {
                        *flag = false;
                    }
                }
                Token::Item(StackItem::Null) => {
                    begin_value(&mut out, &mut needs_comma);
                    out.push_str("null");
                }
                Token::Item(other) => {
                    return Err(Error::format(format!(
                        "{} cannot be converted to JSON",
                        other.item_type().name()
                    )));
                }
            }
            if out.len() > max_size {
                return Err(Error::format(format!(
                    "JSON size {} exceeds limit {max_size}",
                    out.len()
                )));
            }
        }
        Ok(out.into_bytes())
    }

    /// Converts a JSON value to a stack item.
    ///
    /// `limits.max_stack_size` bounds the number of values and properties.
    /// Numbers must be integral.
    pub fn deserialize(json: &Value, limits: &ExecutionEngineLimits) -> Result<StackItem> {
        let mut budget = limits.max_stack_size as usize;
        Self::deserialize_value(json, &mut budget)
    }

    fn take_budget(budget: &mut usize) -> Result<()> {
        *budget = budget
            .checked_sub(1)
            .ok_or_else(|| Error::format("JSON item count exceeds limit"))?;
        Ok(())
    }

    fn deserialize_value(json: &Value, budget: &mut usize) -> Result<StackItem> {
        let mut frames: Vec<ItemFrame<'_>> = Vec::new();
        let mut next = Some(json);
        let mut done: Option<StackItem> = None;
        loop {
            if let Some(json) = next.take() {
                Self::take_budget(budget)?;
                match json {
                    Value::Array(values) => frames.push(ItemFrame::Array {
                        values: values.iter(),
                        items: Vec::with_capacity(values.len()),
                    }),
                    Value::Object(object) => frames.push(ItemFrame::Object {
                        entries: object.iter(),
                        key: None,
                        map: Map::new(),
                    }),
                    Value::Null => done = Some(StackItem::Null),
                    Value::String(text) => done = Some(StackItem::from(text.as_str())),
                    Value::Number(number) => {
                        done = Some(StackItem::Integer(Self::number_to_integer(number)?))
                    }
                    Value::Bool(value) => done = Some(StackItem::Boolean(*value)),
                }
            }
            let Some(frame) = frames.last_mut() else {
                return done.ok_or_else(|| Error::format("no stack item produced"));
            };
            if let Some(item) = done.take() {
                frame.push(item)?;
            }
            match frame.next_child(budget)? {
                Some(child) => next = Some(child),
                None => done = frames.pop().map(ItemFrame::finish),
            }
        }
    }

    fn number_to_integer(number: &serde_json::Number) -> Result<BigInt> {
        if let Some(value) = number.as_i64() {
            return Ok(BigInt::from(value));
        }
        if let Some(value) = number.as_u64() {
            return Ok(BigInt::from(value));
        }
        let value = number
            .as_f64()
            .ok_or_else(|| Error::format("invalid JSON number"))?;
        if !value.is_finite() || !value.fract().is_zero() {
            return Err(Error::format("decimal value is not allowed"));
        }
        BigInt::from_f64(value).ok_or_else(|| Error::format("invalid JSON number"))
    }

    /// Parses JSON text, rejecting nesting deeper than `max_depth`.
    pub fn parse(json: &[u8], max_depth: usize) -> Result<Value> {
        let value: Value =
            serde_json::from_slice(json).map_err(|e| Error::format(format!("invalid JSON: {e}")))?;
        let mut pending = vec![(&value, 1usize)];
        while let Some((node, depth)) = pending.pop() {
            let children: Vec<&Value> = match node {
                Value::Array(values) => values.iter().collect(),
                Value::Object(object) => object.values().collect(),
                _ => continue,
            };
            if depth > max_depth {
                return Err(Error::format(format!(
                    "JSON nesting exceeds depth {max_depth}"
                )));
            }
            pending.extend(children.into_iter().map(|child| (child, depth + 1)));
        }
        Ok(value)
    }
}
