//! Instruction decoding.

use crate::op_code::{OpCode, OperandSize};
use crate::{VmError, VmResult};

/// A decoded instruction borrowed from its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub opcode: OpCode,
    pub operand: &'a [u8],
    /// Total encoded size, opcode byte included.
    pub size: usize,
}

impl<'a> Instruction<'a> {
    /// Decodes the instruction starting at `position`.
    pub fn parse(script: &'a [u8], position: usize) -> VmResult<Self> {
        let byte = *script
            .get(position)
            .ok_or_else(|| VmError::InvalidScript(format!("position {position} out of range")))?;
        let opcode = OpCode::from_u8(byte)?;
        let start = position + 1;
        let (operand_start, operand_len) = match opcode.operand_size() {
            OperandSize::Fixed(size) => (start, size),
            OperandSize::Prefix(prefix) => {
                let bytes = script
                    .get(start..start + prefix)
                    .ok_or_else(|| VmError::InvalidScript("truncated operand prefix".into()))?;
                let mut len = 0usize;
                for (i, b) in bytes.iter().enumerate() {
                    len |= (*b as usize) << (8 * i);
                }
                (start + prefix, len)
            }
        };
        let operand = script
            .get(operand_start..operand_start + operand_len)
            .ok_or_else(|| VmError::InvalidScript("truncated operand".into()))?;
        Ok(Self {
            opcode,
            operand,
            size: operand_start + operand_len - position,
        })
    }

    /// The operand of a `SYSCALL`, read little-endian.
    pub fn token_u32(&self) -> VmResult<u32> {
        let bytes: [u8; 4] = self
            .operand
            .try_into()
            .map_err(|_| VmError::InvalidScript("expected 4-byte operand".into()))?;
        Ok(u32::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pushdata1() {
        let script = [0x0C, 0x02, 0xAA, 0xBB, 0x40];
        let ins = Instruction::parse(&script, 0).unwrap();
        assert_eq!(ins.opcode, OpCode::PUSHDATA1);
        assert_eq!(ins.operand, &[0xAA, 0xBB]);
        assert_eq!(ins.size, 4);
        assert_eq!(Instruction::parse(&script, 4).unwrap().opcode, OpCode::RET);
    }

    #[test]
    fn test_parse_syscall_token() {
        let script = [0x41, 0x78, 0x56, 0x34, 0x12];
        let ins = Instruction::parse(&script, 0).unwrap();
        assert_eq!(ins.token_u32().unwrap(), 0x12345678);
    }

    #[test]
    fn test_truncated_operand_is_error() {
        assert!(Instruction::parse(&[0x0C, 0x05, 0x01], 0).is_err());
        assert!(Instruction::parse(&[0x41, 0x01], 0).is_err());
        assert!(Instruction::parse(&[0x40], 1).is_err());
    }
}
