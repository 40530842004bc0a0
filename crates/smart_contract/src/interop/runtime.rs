//! `System.Runtime.*` services.

use super::{
    Arguments, InteropParameterDescriptor as Param, InteropParameterType as Type, InteropRegistry,
    InteropValue,
};
use crate::application_engine::ApplicationEngine;
use crate::{Error, Result};
use neo_vm::CallFlags;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register(
        super::SYSTEM_RUNTIME_NOTIFY,
        notify,
        1 << 15,
        CallFlags::ALLOW_NOTIFY,
        vec![
            Param::new("eventName", Type::ByteArray),
            Param::new("state", Type::Array),
        ],
    );
    registry.register(
        super::SYSTEM_RUNTIME_LOG,
        log,
        1 << 15,
        CallFlags::ALLOW_NOTIFY,
        vec![Param::new("message", Type::ByteArray)],
    );
    registry.register(
        super::SYSTEM_RUNTIME_GET_TRIGGER,
        get_trigger,
        1 << 3,
        CallFlags::NONE,
        vec![],
    );
    registry.register(
        super::SYSTEM_RUNTIME_GET_EXECUTING_SCRIPT_HASH,
        get_executing_script_hash,
        1 << 4,
        CallFlags::NONE,
        vec![],
    );
    registry.register(
        super::SYSTEM_RUNTIME_GET_CALLING_SCRIPT_HASH,
        get_calling_script_hash,
        1 << 4,
        CallFlags::NONE,
        vec![],
    );
}

fn notify(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let name = args
        .next()?
        .into_bytes()?
        .ok_or_else(|| Error::argument("event name can't be null"))?;
    let state = args.next()?.into_item()?;
    engine.runtime_notify(&name, state)?;
    Ok(InteropValue::Void)
}

fn log(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let message = args
        .next()?
        .into_bytes()?
        .ok_or_else(|| Error::argument("log message can't be null"))?;
    engine.runtime_log(&message)?;
    Ok(InteropValue::Void)
}

fn get_trigger(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    Ok(InteropValue::from(engine.trigger() as u8))
}

fn get_executing_script_hash(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    Ok(InteropValue::from(engine.current_script_hash()?))
}

fn get_calling_script_hash(engine: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
    Ok(engine.calling_script_hash().into())
}
