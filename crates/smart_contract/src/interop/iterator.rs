//! `System.Iterator.*` services over storage search results.

use super::{
    Arguments, InteropParameterDescriptor as Param, InteropParameterType as Type, InteropRegistry,
    InteropValue,
};
use crate::application_engine::ApplicationEngine;
use crate::storage::StorageIterator;
use crate::Result;
use neo_vm::CallFlags;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register(
        super::SYSTEM_ITERATOR_NEXT,
        next,
        1 << 15,
        CallFlags::NONE,
        vec![Param::new("iterator", Type::InteropInterface)],
    );
    registry.register(
        super::SYSTEM_ITERATOR_VALUE,
        value,
        1 << 4,
        CallFlags::NONE,
        vec![Param::new("iterator", Type::InteropInterface)],
    );
}

fn next(engine: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let item = args.next()?.into_item()?;
    Ok(InteropValue::Boolean(
        item.as_interface::<StorageIterator>()?.next(engine.snapshot()),
    ))
}

fn value(_: &mut ApplicationEngine, mut args: Arguments) -> Result<InteropValue> {
    let item = args.next()?.into_item()?;
    Ok(InteropValue::Item(
        item.as_interface::<StorageIterator>()?.value()?,
    ))
}
