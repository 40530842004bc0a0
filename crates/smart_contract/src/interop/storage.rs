//! `System.Storage.*` services.

use super::{
    Arguments, InteropParameterDescriptor as Param, InteropParameterType as Type, InteropRegistry,
    InteropValue,
};
use crate::application_engine::ApplicationEngine;
use crate::native;
use crate::storage::{FindOptions, StorageContext, StorageItem, StorageIterator, StorageKey};
use crate::{Error, Result};
use neo_config::{MAX_STORAGE_KEY_SIZE, MAX_STORAGE_VALUE_SIZE};
use neo_vm::CallFlags;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register(
        super::SYSTEM_STORAGE_GET_CONTEXT,
        get_context,
        1 << 4,
        CallFlags::READ_STATES,
        vec![],
    );
    registry.register(
        super::SYSTEM_STORAGE_GET_READ_ONLY_CONTEXT,
        get_read_only_context,
        1 << 4,
        CallFlags::READ_STATES,
        vec![],
    );
    registry.register(
        super::SYSTEM_STORAGE_AS_READ_ONLY,
        as_read_only,
        1 << 4,
        CallFlags::READ_STATES,
        vec![Param::new("context", Type::InteropInterface)],
    );
    registry.register(
        super::SYSTEM_STORAGE_GET,
        get,
        1 << 15,
        CallFlags::READ_STATES,
        vec![
            Param::new("context", Type::InteropInterface),
            Param::new("key", Type::ByteArray),
        ],
    );
    registry.register(
        super::SYSTEM_STORAGE_FIND,
        find,
        1 << 15,
        CallFlags::READ_STATES,
        vec![
            Param::new("context", Type::InteropInterface),
            Param::new("prefix", Type::ByteArray),
            Param::new("options", Type::U8),
        ],
    );
    registry.register(
        super::SYSTEM_STORAGE_PUT,
        put,
        1 << 15,
        CallFlags::WRITE_STATES,
        vec![
            Param::new("context", Type::InteropInterface),
            Param::new("key", Type::ByteArray),
            Param::new("value", Type::ByteArray),
        ],
    );
    registry.register(
        super::SYSTEM_STORAGE_DELETE,
        delete,
        1 << 15,
        CallFlags::WRITE_STATES,
        vec![
            Param::new("context", Type::InteropInterface),
            Param::new("key", Type::ByteArray),
        ],
    );
}

/// Storage units billed for writing a `new_len`-byte value under a
/// `key_len`-byte key that currently holds `old_len` bytes, if anything.
///
/// A new key pays for its key and value. Overwriting pays a quarter of the
/// retained bytes, rounded up, plus every byte the value grows by.
pub fn storage_fee_units(key_len: usize, old_len: Option<usize>, new_len: usize) -> i64 {
    let units = match old_len {
        None => key_len + new_len,
        Some(_) if new_len == 0 => 0,
        Some(0) => new_len,
        Some(old_len) if new_len <= old_len => (new_len - 1) / 4 + 1,
        Some(old_len) => (old_len - 1) / 4 + 1 + new_len - old_len,
    };
    units as i64
}

fn context_arg(args: &mut Arguments) -> Result<StorageContext> {
    let item = args.next()?.into_item()?;
    Ok(*item.as_interface::<StorageContext>()?)
}

fn bytes_arg(args: &mut Arguments, name: &str) -> Result<Vec<u8>> {
    args.next()?
        .into_bytes()?
        .ok_or_else(|| Error::argument(format!("{name} can't be null")))
}

fn current_context(engine: &ApplicationEngine, is_read_only: bool) -> Result<StorageContext> {
    let hash = engine.current_script_hash()?;
    let contract = native::contract_management()
        .get_contract(engine.snapshot(), &hash)?
        .ok_or_else(|| Error::state(format!("contract {hash} has no storage")))?;
    Ok(StorageContext::new(contract.id, is_read_only))
}

fn get_context(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    Ok(InteropValue::interface(current_context(engine, false)?))
}

fn get_read_only_context(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    Ok(InteropValue::interface(current_context(engine, true)?))
}

fn as_read_only(_: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let context = context_arg(&mut args)?;
    Ok(InteropValue::interface(context.as_read_only()))
}

fn get(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let context = context_arg(&mut args)?;
    let key = bytes_arg(&mut args, "key")?;
    match engine.snapshot().try_get(&StorageKey::new(context.id, key)) {
        Some(item) => Ok(InteropValue::Bytes(item.value()?)),
        None => Ok(InteropValue::Null),
    }
}

fn find(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let context = context_arg(&mut args)?;
    let prefix = bytes_arg(&mut args, "prefix")?;
    let options = FindOptions::parse(args.next()?.into_int()?)?;
    Ok(InteropValue::interface(StorageIterator::new(
        StorageKey::create_search_prefix(context.id, &prefix),
        prefix.len(),
        options,
        *engine.limits(),
    )))
}

fn put(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let context = context_arg(&mut args)?;
    let key = bytes_arg(&mut args, "key")?;
    let value = bytes_arg(&mut args, "value")?;
    if key.len() > MAX_STORAGE_KEY_SIZE {
        return Err(Error::argument(format!(
            "key is {} bytes, the maximum is {MAX_STORAGE_KEY_SIZE}",
            key.len()
        )));
    }
    if value.len() > MAX_STORAGE_VALUE_SIZE {
        return Err(Error::argument(format!(
            "value is {} bytes, the maximum is {MAX_STORAGE_VALUE_SIZE}",
            value.len()
        )));
    }
    if context.is_read_only {
        return Err(Error::permission("the storage context is read-only"));
    }
    let key_len = key.len();
    let storage_key = StorageKey::new(context.id, key);
    let old_len = match engine.snapshot().try_get(&storage_key) {
        Some(item) => Some(item.value()?.len()),
        None => None,
    };
    let units = storage_fee_units(key_len, old_len, value.len());
    engine.add_gas(units * engine.storage_price())?;
    engine
        .snapshot_mut()
        .get_or_add(&storage_key, StorageItem::default)
        .set_value(value);
    Ok(InteropValue::Void)
}

fn delete(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let context = context_arg(&mut args)?;
    let key = bytes_arg(&mut args, "key")?;
    if context.is_read_only {
        return Err(Error::permission("the storage context is read-only"));
    }
    engine
        .snapshot_mut()
        .delete(&StorageKey::new(context.id, key));
    Ok(InteropValue::Void)
}
