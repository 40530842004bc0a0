//! # Neo Core
//!
//! Primitive types shared by the execution crates:
//! - [`UInt160`]: 160-bit script hash
//! - [`crypto`]: the hash functions used for script hashes, selectors and checksums

pub mod crypto;
mod error;
mod uint160;

pub use error::{CoreError, CoreResult};
pub use uint160::{UInt160, UINT160_SIZE};
