//! IO error types.

use thiserror::Error;

/// Errors raised while decoding or encoding binary data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    #[error("unexpected end of data")]
    EndOfStream,
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("value {value} exceeds maximum {max}")]
    ExceedsMaximum { value: u64, max: u64 },
}

impl IoError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        IoError::InvalidData(message.into())
    }
}

/// Result alias for IO operations.
pub type IoResult<T> = Result<T, IoError>;
