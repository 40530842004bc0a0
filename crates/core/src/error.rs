use thiserror::Error;

/// Errors raised by primitive parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
