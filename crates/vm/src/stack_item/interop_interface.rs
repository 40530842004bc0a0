use std::any::Any;
use std::fmt;

/// A host object carried on the stack as an opaque handle.
pub trait InteropInterface: fmt::Debug {
    /// Name of the wrapped host type, used in diagnostics.
    fn interface_type(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}
