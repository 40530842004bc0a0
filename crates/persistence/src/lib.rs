//! # Neo Persistence
//!
//! Raw byte-keyed stores that snapshots and contract storage are layered on.
//! Keys are ordered lexicographically; seeking by prefix returns entries in
//! key order or its reverse.

mod memory_store;
mod seek_direction;
mod store;

pub use memory_store::MemoryStore;
pub use seek_direction::SeekDirection;
pub use store::{seek_bounds, ReadOnlyStore, SeekIterator, Store, WriteBatch};
