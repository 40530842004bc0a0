//! Contract storage: keys, values, scopes and search results.

mod find_options;
mod key_builder;
mod storage_context;
mod storage_item;
mod storage_iterator;
mod storage_key;

pub use find_options::FindOptions;
pub use key_builder::KeyBuilder;
pub use storage_context::StorageContext;
pub use storage_item::StorageItem;
pub use storage_iterator::StorageIterator;
pub use storage_key::StorageKey;
