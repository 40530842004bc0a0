//! Base prices of the opcodes the engine executes, before the execution
//! fee factor is applied.

use neo_vm::OpCode;

/// The base price of `opcode` in datoshi.
pub fn op_code_price(opcode: OpCode) -> i64 {
    match opcode {
        OpCode::PUSHINT8
        | OpCode::PUSHINT16
        | OpCode::PUSHINT32
        | OpCode::PUSHINT64
        | OpCode::PUSHT
        | OpCode::PUSHF
        | OpCode::PUSHNULL
        | OpCode::PUSHM1
        | OpCode::PUSH0
        | OpCode::PUSH1
        | OpCode::PUSH2
        | OpCode::PUSH3
        | OpCode::PUSH4
        | OpCode::PUSH5
        | OpCode::PUSH6
        | OpCode::PUSH7
        | OpCode::PUSH8
        | OpCode::PUSH9
        | OpCode::PUSH10
        | OpCode::PUSH11
        | OpCode::PUSH12
        | OpCode::PUSH13
        | OpCode::PUSH14
        | OpCode::PUSH15
        | OpCode::PUSH16
        | OpCode::NOP => 1,
        OpCode::PUSHINT128 | OpCode::PUSHINT256 | OpCode::PUSHA => 1 << 2,
        OpCode::PUSHDATA1 => 1 << 3,
        OpCode::PUSHDATA2 => 1 << 9,
        OpCode::PUSHDATA4 => 1 << 12,
        OpCode::DROP | OpCode::DUP | OpCode::SWAP => 1 << 1,
        OpCode::THROW => 1 << 9,
        OpCode::PACK => 1 << 11,
        OpCode::ABORT | OpCode::RET | OpCode::SYSCALL => 0,
    }
}
