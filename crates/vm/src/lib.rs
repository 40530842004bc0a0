//! Neo VM primitives.
//!
//! The value model (stack items), capability flags, opcode set and script
//! construction used by the contract runtime. The instruction loop itself lives
//! in the application engine.

pub mod call_flags;
pub mod error;
pub mod evaluation_stack;
pub mod execution_engine_limits;
pub mod instruction;
pub mod op_code;
pub mod script_builder;
pub mod stack_item;
pub mod vm_state;

pub use call_flags::CallFlags;
pub use error::{VmError, VmResult};
pub use evaluation_stack::EvaluationStack;
pub use execution_engine_limits::ExecutionEngineLimits;
pub use instruction::Instruction;
pub use op_code::OpCode;
pub use script_builder::ScriptBuilder;
pub use stack_item::{Array, InteropInterface, Map, StackItem, StackItemType, Struct};
pub use vm_state::VMState;
