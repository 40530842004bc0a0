//! Contract hashing and script checks.

use crate::manifest::ContractAbi;
use crate::{Error, Result};
use neo_core::UInt160;
use neo_vm::{CallFlags, Instruction, OpCode, ScriptBuilder, StackItem};
use std::collections::BTreeSet;

/// The hash of a contract deployed by `sender` with the given NEF checksum
/// and manifest name.
pub fn get_contract_hash(sender: &UInt160, nef_checksum: u32, name: &str) -> UInt160 {
    let mut sb = ScriptBuilder::new();
    sb.emit(OpCode::ABORT);
    sb.emit_push_bytes(sender.as_bytes());
    // A u32 always fits in a PUSHINT64.
    let _ = sb.emit_push_int(nef_checksum);
    sb.emit_push_string(name);
    UInt160::from_script(&sb.to_array())
}

/// Decodes every instruction of `script` and checks that each ABI method
/// starts on an instruction boundary.
pub fn check_script(script: &[u8], abi: &ContractAbi) -> Result<()> {
    let mut boundaries = BTreeSet::new();
    let mut position = 0;
    while position < script.len() {
        boundaries.insert(position);
        position += Instruction::parse(script, position)?.size;
    }
    abi.validate()?;
    for method in &abi.methods {
        if !boundaries.contains(&(method.offset as usize)) {
            return Err(Error::format(format!(
                "method {} points at offset {}, which is not an instruction",
                method.name, method.offset
            )));
        }
    }
    Ok(())
}

/// Emits a push of a primitive item or of an array of them.
pub fn emit_push_item(sb: &mut ScriptBuilder, item: &StackItem) -> Result<()> {
    match item {
        StackItem::Null => {
            sb.emit(OpCode::PUSHNULL);
        }
        StackItem::Boolean(value) => {
            sb.emit_push_bool(*value);
        }
        StackItem::Integer(value) => {
            sb.emit_push_int(value.clone())?;
        }
        StackItem::ByteString(bytes) | StackItem::Buffer(bytes) => {
            sb.emit_push_bytes(bytes);
        }
        StackItem::Array(array) => emit_pack(sb, &array.to_vec())?,
        StackItem::Struct(fields) => emit_pack(sb, &fields.to_vec())?,
        other => {
            return Err(Error::argument(format!(
                "can't emit a push of {}",
                other.item_type().name()
            )))
        }
    }
    Ok(())
}

fn emit_pack(sb: &mut ScriptBuilder, items: &[StackItem]) -> Result<()> {
    for item in items.iter().rev() {
        emit_push_item(sb, item)?;
    }
    sb.emit_push_int(items.len())?;
    sb.emit(OpCode::PACK);
    Ok(())
}

/// Emits `System.Contract.Call` of `method` on `hash` with `args` packed
/// into an array.
pub fn emit_dynamic_call(
    sb: &mut ScriptBuilder,
    hash: &UInt160,
    method: &str,
    flags: CallFlags,
    args: &[StackItem],
) -> Result<()> {
    emit_pack(sb, args)?;
    sb.emit_push_int(flags.bits())?;
    sb.emit_push_string(method);
    sb.emit_push_bytes(hash.as_bytes());
    sb.emit_syscall(crate::interop::selector(crate::interop::SYSTEM_CONTRACT_CALL));
    Ok(())
}
