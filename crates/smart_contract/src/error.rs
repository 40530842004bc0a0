//! Error types for the contract runtime.

use neo_io::IoError;
use neo_vm::VmError;
use thiserror::Error;

/// Errors raised by interop services, serializers and native contracts.
///
/// Every variant except [`Error::OutOfGas`] is fatal to the current call only;
/// the engine turns all of them into a `FAULT`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed bytes or JSON, oversize payloads, exhausted item budgets.
    #[error("format error: {0}")]
    Format(String),

    /// An interop or native method argument is out of range or inconsistent.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The executing context lacks a required call flag or witness.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A referenced contract, method or id does not exist, or a lifecycle
    /// precondition does not hold.
    #[error("invalid state: {0}")]
    State(String),

    #[error("insufficient gas: consumed {consumed}, limit {limit}")]
    OutOfGas { consumed: i64, limit: i64 },

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Vm(#[from] VmError),
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Error::State(message.into())
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Error::NotSupported(message.into())
    }

    /// Whether the error aborts the whole transaction rather than a single call.
    pub fn is_fatal_to_transaction(&self) -> bool {
        matches!(self, Error::OutOfGas { .. })
    }
}

impl From<neo_core::CoreError> for Error {
    fn from(error: neo_core::CoreError) -> Self {
        Error::Format(error.to_string())
    }
}

/// Result type for contract runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
