//! `System.Contract.*` services.

use super::{
    Arguments, InteropParameterDescriptor as Param, InteropParameterType as Type, InteropRegistry,
    InteropValue,
};
use crate::application_engine::ApplicationEngine;
use crate::native;
use crate::{Error, Result};
use neo_vm::{CallFlags, StackItem};

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register(
        super::SYSTEM_CONTRACT_CALL,
        call,
        1 << 15,
        CallFlags::READ_STATES | CallFlags::ALLOW_CALL,
        vec![
            Param::new("contractHash", Type::Hash160),
            Param::new("method", Type::String),
            Param::new("callFlags", Type::U8),
            Param::new("args", Type::Array),
        ],
    );
    registry.register(
        super::SYSTEM_CONTRACT_CALL_NATIVE,
        call_native,
        0,
        CallFlags::NONE,
        vec![Param::new("version", Type::U8)],
    );
    registry.register(
        super::SYSTEM_CONTRACT_GET_CALL_FLAGS,
        get_call_flags,
        1 << 10,
        CallFlags::NONE,
        vec![],
    );
}

fn call(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let hash = args
        .next()?
        .into_hash160()?
        .ok_or_else(|| Error::argument("contract hash can't be null"))?;
    let method = args
        .next()?
        .into_string()?
        .ok_or_else(|| Error::argument("method can't be null"))?;
    let raw_flags: u8 = args.next()?.into_int()?;
    let flags = CallFlags::from_byte(raw_flags)
        .ok_or_else(|| Error::argument(format!("invalid call flags: {raw_flags:#04x}")))?;
    let arguments = match args.next()?.into_item()? {
        StackItem::Array(array) => array.to_vec(),
        StackItem::Struct(fields) => fields.to_vec(),
        other => {
            return Err(Error::argument(format!(
                "expected an argument array, found {}",
                other.item_type().name()
            )))
        }
    };
    engine.call_contract(hash, &method, flags, arguments)?;
    Ok(InteropValue::Void)
}

fn call_native(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let version: u8 = args.next()?.into_int()?;
    native::invoke(engine, version)?;
    Ok(InteropValue::Void)
}

fn get_call_flags(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    let flags = engine
        .current_context()
        .map(|context| context.call_flags())
        .ok_or_else(|| Error::state("no context is executing"))?;
    Ok(InteropValue::from(flags.bits()))
}
