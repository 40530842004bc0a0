//! The opcode subset understood by the runtime's instruction loop.

use crate::{VmError, VmResult};

/// How an opcode's operand is laid out in the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSize {
    /// A fixed number of bytes follows the opcode.
    Fixed(usize),
    /// A little-endian length of this many bytes follows, then that many bytes.
    Prefix(usize),
}

/// Represents the opcode of an instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum OpCode {
    PUSHINT8 = 0x00,
    PUSHINT16 = 0x01,
    PUSHINT32 = 0x02,
    PUSHINT64 = 0x03,
    PUSHINT128 = 0x04,
    PUSHINT256 = 0x05,
    PUSHT = 0x08,
    PUSHF = 0x09,
    PUSHA = 0x0A,
    PUSHNULL = 0x0B,
    PUSHDATA1 = 0x0C,
    PUSHDATA2 = 0x0D,
    PUSHDATA4 = 0x0E,
    PUSHM1 = 0x0F,
    PUSH0 = 0x10,
    PUSH1 = 0x11,
    PUSH2 = 0x12,
    PUSH3 = 0x13,
    PUSH4 = 0x14,
    PUSH5 = 0x15,
    PUSH6 = 0x16,
    PUSH7 = 0x17,
    PUSH8 = 0x18,
    PUSH9 = 0x19,
    PUSH10 = 0x1A,
    PUSH11 = 0x1B,
    PUSH12 = 0x1C,
    PUSH13 = 0x1D,
    PUSH14 = 0x1E,
    PUSH15 = 0x1F,
    PUSH16 = 0x20,
    NOP = 0x21,
    ABORT = 0x38,
    THROW = 0x3A,
    RET = 0x40,
    SYSCALL = 0x41,
    DROP = 0x45,
    DUP = 0x4A,
    SWAP = 0x50,
    PACK = 0xC0,
}

impl OpCode {
    const SMALL_INTS: [OpCode; 17] = [
        OpCode::PUSH0,
        OpCode::PUSH1,
        OpCode::PUSH2,
        OpCode::PUSH3,
        OpCode::PUSH4,
        OpCode::PUSH5,
        OpCode::PUSH6,
        OpCode::PUSH7,
        OpCode::PUSH8,
        OpCode::PUSH9,
        OpCode::PUSH10,
        OpCode::PUSH11,
        OpCode::PUSH12,
        OpCode::PUSH13,
        OpCode::PUSH14,
        OpCode::PUSH15,
        OpCode::PUSH16,
    ];

    pub fn from_u8(value: u8) -> VmResult<Self> {
        let op = match value {
            0x00 => OpCode::PUSHINT8,
            0x01 => OpCode::PUSHINT16,
            0x02 => OpCode::PUSHINT32,
            0x03 => OpCode::PUSHINT64,
            0x04 => OpCode::PUSHINT128,
            0x05 => OpCode::PUSHINT256,
            0x08 => OpCode::PUSHT,
            0x09 => OpCode::PUSHF,
            0x0A => OpCode::PUSHA,
            0x0B => OpCode::PUSHNULL,
            0x0C => OpCode::PUSHDATA1,
            0x0D => OpCode::PUSHDATA2,
            0x0E => OpCode::PUSHDATA4,
            0x0F => OpCode::PUSHM1,
            0x10..=0x20 => Self::SMALL_INTS[(value - 0x10) as usize],
            0x21 => OpCode::NOP,
            0x38 => OpCode::ABORT,
            0x3A => OpCode::THROW,
            0x40 => OpCode::RET,
            0x41 => OpCode::SYSCALL,
            0x45 => OpCode::DROP,
            0x4A => OpCode::DUP,
            0x50 => OpCode::SWAP,
            0xC0 => OpCode::PACK,
            other => return Err(VmError::InvalidOpcode(other)),
        };
        Ok(op)
    }

    /// The `PUSH0`..`PUSH16` opcode for `value`, if it is in range.
    pub fn push_small_int(value: u8) -> Option<Self> {
        Self::SMALL_INTS.get(value as usize).copied()
    }

    pub fn operand_size(&self) -> OperandSize {
        match self {
            OpCode::PUSHINT8 => OperandSize::Fixed(1),
            OpCode::PUSHINT16 => OperandSize::Fixed(2),
            OpCode::PUSHINT32 | OpCode::PUSHA | OpCode::SYSCALL => OperandSize::Fixed(4),
            OpCode::PUSHINT64 => OperandSize::Fixed(8),
            OpCode::PUSHINT128 => OperandSize::Fixed(16),
            OpCode::PUSHINT256 => OperandSize::Fixed(32),
            OpCode::PUSHDATA1 => OperandSize::Prefix(1),
            OpCode::PUSHDATA2 => OperandSize::Prefix(2),
            OpCode::PUSHDATA4 => OperandSize::Prefix(4),
            _ => OperandSize::Fixed(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_roundtrip() {
        for byte in 0u8..=0xFF {
            if let Ok(op) = OpCode::from_u8(byte) {
                assert_eq!(op as u8, byte);
            }
        }
        assert_eq!(OpCode::from_u8(0x06), Err(VmError::InvalidOpcode(0x06)));
    }

    #[test]
    fn test_small_ints() {
        assert_eq!(OpCode::push_small_int(0), Some(OpCode::PUSH0));
        assert_eq!(OpCode::push_small_int(16), Some(OpCode::PUSH16));
        assert_eq!(OpCode::push_small_int(17), None);
    }
}
