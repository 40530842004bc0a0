//! Interop services for smart contracts.
//!
//! Every service is registered once, under the selector derived from its
//! name, in a process-wide [`InteropRegistry`]. A `SYSCALL` instruction
//! carries the selector; the engine looks the descriptor up, checks the
//! call flags, charges the fixed price and converts the declared
//! parameters before calling the handler.

mod contract;
mod interop_parameter_descriptor;
mod interop_value;
mod iterator;
mod runtime;
mod storage;

pub use interop_parameter_descriptor::{
    InteropParameterDescriptor, InteropParameterType, MaxLengthValidator, ParameterValidator,
};
pub use interop_value::{Arguments, InteropValue};
pub use storage::storage_fee_units;

use crate::application_engine::ApplicationEngine;
use crate::Result;
use neo_core::crypto;
use neo_vm::CallFlags;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const SYSTEM_CONTRACT_CALL: &str = "System.Contract.Call";
pub const SYSTEM_CONTRACT_CALL_NATIVE: &str = "System.Contract.CallNative";
pub const SYSTEM_CONTRACT_GET_CALL_FLAGS: &str = "System.Contract.GetCallFlags";
pub const SYSTEM_STORAGE_GET_CONTEXT: &str = "System.Storage.GetContext";
pub const SYSTEM_STORAGE_GET_READ_ONLY_CONTEXT: &str = "System.Storage.GetReadOnlyContext";
pub const SYSTEM_STORAGE_AS_READ_ONLY: &str = "System.Storage.AsReadOnly";
pub const SYSTEM_STORAGE_GET: &str = "System.Storage.Get";
pub const SYSTEM_STORAGE_FIND: &str = "System.Storage.Find";
pub const SYSTEM_STORAGE_PUT: &str = "System.Storage.Put";
pub const SYSTEM_STORAGE_DELETE: &str = "System.Storage.Delete";
pub const SYSTEM_ITERATOR_NEXT: &str = "System.Iterator.Next";
pub const SYSTEM_ITERATOR_VALUE: &str = "System.Iterator.Value";
pub const SYSTEM_RUNTIME_NOTIFY: &str = "System.Runtime.Notify";
pub const SYSTEM_RUNTIME_LOG: &str = "System.Runtime.Log";
pub const SYSTEM_RUNTIME_GET_TRIGGER: &str = "System.Runtime.GetTrigger";
pub const SYSTEM_RUNTIME_GET_EXECUTING_SCRIPT_HASH: &str = "System.Runtime.GetExecutingScriptHash";
pub const SYSTEM_RUNTIME_GET_CALLING_SCRIPT_HASH: &str = "System.Runtime.GetCallingScriptHash";

/// Handler of an interop service. Arguments arrive converted, in
/// declaration order.
pub type InteropHandler = fn(&mut ApplicationEngine, Arguments) -> Result<InteropValue>;

/// The selector of a service: the first four bytes of the SHA-256 of its
/// name, read little-endian.
pub fn selector(name: &str) -> u32 {
    let hash = crypto::sha256(name.as_bytes());
    u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
}

/// Represents a descriptor for an interop service.
#[derive(Clone)]
pub struct InteropDescriptor {
    pub name: &'static str,
    pub hash: u32,
    pub handler: InteropHandler,
    pub fixed_price: i64,
    pub required_call_flags: CallFlags,
    pub parameters: Vec<InteropParameterDescriptor>,
}

impl fmt::Debug for InteropDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteropDescriptor")
            .field("name", &self.name)
            .field("hash", &format_args!("{:#010x}", self.hash))
            .field("fixed_price", &self.fixed_price)
            .field("required_call_flags", &self.required_call_flags)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Registry for interop services, keyed by selector.
#[derive(Debug, Default)]
pub struct InteropRegistry {
    services: BTreeMap<u32, InteropDescriptor>,
}

impl InteropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service and returns its selector.
    ///
    /// # Panics
    ///
    /// Panics if a service with the same selector is already registered.
    pub fn register(
        &mut self,
        name: &'static str,
        handler: InteropHandler,
        fixed_price: i64,
        required_call_flags: CallFlags,
        parameters: Vec<InteropParameterDescriptor>,
    ) -> u32 {
        let hash = selector(name);
        if let Some(existing) = self.services.get(&hash) {
            panic!(
                "interop service {name} collides with {} on selector {hash:#010x}",
                existing.name
            );
        }
        self.services.insert(
            hash,
            InteropDescriptor {
                name,
                hash,
                handler,
                fixed_price,
                required_call_flags,
                parameters,
            },
        );
        hash
    }

    pub fn get(&self, hash: u32) -> Option<&InteropDescriptor> {
        self.services.get(&hash)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&InteropDescriptor> {
        self.get(selector(name))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteropDescriptor> {
        self.services.values()
    }
}

static SERVICES: Lazy<InteropRegistry> = Lazy::new(|| {
    let mut registry = InteropRegistry::new();
    contract::register(&mut registry);
    storage::register(&mut registry);
    iterator::register(&mut registry);
    runtime::register(&mut registry);
    debug!(services = registry.len(), "interop registry built");
    registry
});

/// The services every engine dispatches `SYSCALL`s to.
pub fn services() -> &'static InteropRegistry {
    &SERVICES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::InteropValue;

    fn noop(_: &mut ApplicationEngine, _: Arguments) -> Result<InteropValue> {
        Ok(InteropValue::Void)
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(selector(SYSTEM_CONTRACT_CALL), 0x525b7d62);
        assert_eq!(selector(SYSTEM_STORAGE_GET_CONTEXT), 0xce67f69b);
        assert_eq!(selector(SYSTEM_STORAGE_PUT), 0x84183fe6);
    }

    #[test]
    fn test_registry_contents() {
        let registry = services();
        assert_eq!(registry.len(), 17);
        let put = registry.get_by_name(SYSTEM_STORAGE_PUT).unwrap();
        assert_eq!(put.fixed_price, 1 << 15);
        assert_eq!(put.required_call_flags, CallFlags::WRITE_STATES);
        assert_eq!(put.parameters.len(), 3);
        let call = registry.get(0x525b7d62).unwrap();
        assert_eq!(call.name, SYSTEM_CONTRACT_CALL);
        assert_eq!(call.required_call_flags, CallFlags::READ_STATES | CallFlags::ALLOW_CALL);
    }

    #[test]
    #[should_panic(expected = "collides")]
    fn test_duplicate_registration_panics() {
        let mut registry = InteropRegistry::new();
        registry.register("Test.Service", noop, 1, CallFlags::NONE, vec![]);
        registry.register("Test.Service", noop, 2, CallFlags::NONE, vec![]);
    }
}
