//! Script builder module for the Neo Virtual Machine.
//!
//! This module provides a way to programmatically construct scripts for the Neo VM.

use crate::op_code::OpCode;
use crate::stack_item::integer_to_bytes;
use crate::{VmError, VmResult};
use num_bigint::BigInt;

/// Helps construct VM scripts programmatically.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The length of the script emitted so far.
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Emits an opcode to the script.
    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.script.push(op as u8);
        self
    }

    /// Emits an opcode followed by its raw operand.
    pub fn emit_with_operand(&mut self, op: OpCode, operand: &[u8]) -> &mut Self {
        self.script.push(op as u8);
        self.script.extend_from_slice(operand);
        self
    }

    /// Emits the shortest push of an integer.
    pub fn emit_push_int(&mut self, value: impl Into<BigInt>) -> VmResult<&mut Self> {
        let value = value.into();
        if value >= BigInt::from(-1) && value <= BigInt::from(16) {
            let small = i8::try_from(&value).unwrap_or(0);
            if small == -1 {
                return Ok(self.emit(OpCode::PUSHM1));
            }
            if let Some(op) = OpCode::push_small_int(small as u8) {
                return Ok(self.emit(op));
            }
        }
        let bytes = integer_to_bytes(&value);
        let (op, width) = match bytes.len() {
            0..=1 => (OpCode::PUSHINT8, 1),
            2 => (OpCode::PUSHINT16, 2),
            3..=4 => (OpCode::PUSHINT32, 4),
            5..=8 => (OpCode::PUSHINT64, 8),
            9..=16 => (OpCode::PUSHINT128, 16),
            17..=32 => (OpCode::PUSHINT256, 32),
            len => {
                return Err(VmError::SizeExceeded { size: len, limit: 32 });
            }
        };
        let pad = if value.sign() == num_bigint::Sign::Minus { 0xFF } else { 0x00 };
        let mut operand = bytes;
        operand.resize(width, pad);
        Ok(self.emit_with_operand(op, &operand))
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit(if value { OpCode::PUSHT } else { OpCode::PUSHF })
    }

    /// Emits a `PUSHDATA` of the smallest width that fits `data`.
    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len < 0x100 {
            self.emit_with_operand(OpCode::PUSHDATA1, &[len as u8]);
        } else if len < 0x10000 {
            self.emit_with_operand(OpCode::PUSHDATA2, &(len as u16).to_le_bytes());
        } else {
            self.emit_with_operand(OpCode::PUSHDATA4, &(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    pub fn emit_push_string(&mut self, value: &str) -> &mut Self {
        self.emit_push_bytes(value.as_bytes())
    }

    /// Emits a `SYSCALL` with the given selector.
    pub fn emit_syscall(&mut self, api: u32) -> &mut Self {
        self.emit_with_operand(OpCode::SYSCALL, &api.to_le_bytes())
    }

    pub fn to_array(&self) -> Vec<u8> {
        self.script.clone()
    }

    pub fn into_script(self) -> Vec<u8> {
        self.script
    }
}
