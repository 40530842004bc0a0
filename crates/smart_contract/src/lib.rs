//! # Neo Smart Contract
//!
//! The contract runtime of a Neo N3 node: the application engine and its
//! interop services, contract storage, the stack item serializers, the
//! NEF and manifest formats, and the native contracts that are dispatched
//! from synthetic scripts back into the host.

pub mod application_engine;
pub mod binary_serializer;
pub mod contract_state;
pub mod contract_task;
pub mod data_cache;
pub mod error;
pub mod helper;
pub mod interop;
pub mod interoperable;
pub mod json_serializer;
pub mod manifest;
pub mod method_token;
pub mod native;
pub mod nef_file;
pub mod storage;

pub use application_engine::{ApplicationEngine, Transaction, TriggerType};
pub use binary_serializer::BinarySerializer;
pub use contract_state::ContractState;
pub use contract_task::ContractTask;
pub use data_cache::DataCache;
pub use error::{Error, Result};
pub use interoperable::Interoperable;
pub use json_serializer::JsonSerializer;
pub use method_token::MethodToken;
pub use nef_file::NefFile;
