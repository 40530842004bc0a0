use neo_vm::InteropInterface;
use std::any::Any;

/// The storage scope handed to a contract: whose keys it addresses and
/// whether writes are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageContext {
    pub id: i32,
    pub is_read_only: bool,
}

impl StorageContext {
    pub fn new(id: i32, is_read_only: bool) -> Self {
        Self { id, is_read_only }
    }

    /// The same scope without write access.
    pub fn as_read_only(self) -> Self {
        Self {
            is_read_only: true,
            ..self
        }
    }
}

impl InteropInterface for StorageContext {
    fn interface_type(&self) -> &str {
        "StorageContext"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
