//! VM error types.

use thiserror::Error;

/// Errors raised by stack item conversions and script handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("invalid type: expected {expected}, found {found}")]
    InvalidType { expected: String, found: String },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("stack underflow: requested {requested}, available {available}")]
    StackUnderflow { requested: usize, available: usize },
    #[error("stack overflow: limit {0}")]
    StackOverflow(usize),
    #[error("invalid script: {0}")]
    InvalidScript(String),
    #[error("unknown opcode: 0x{0:02x}")]
    InvalidOpcode(u8),
    #[error("size {size} exceeds limit {limit}")]
    SizeExceeded { size: usize, limit: usize },
}

impl VmError {
    pub fn invalid_type(expected: impl Into<String>, found: impl Into<String>) -> Self {
        VmError::InvalidType {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        VmError::InvalidOperation(message.into())
    }
}

pub type VmResult<T> = Result<T, VmError>;
