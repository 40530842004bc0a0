//! Neo.IO - binary reading and writing primitives.
//!
//! Little-endian fixed-width integers, Neo variable-length integers and
//! length-prefixed byte strings, plus the [`Serializable`] trait built on them.

mod binary_writer;
mod error;
mod memory_reader;
mod serializable;

pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use memory_reader::MemoryReader;
pub use serializable::{helper, Serializable, SerializableExt};

/// Returns the encoded size of a variable-length integer.
pub fn var_int_size(value: u64) -> usize {
    if value < 0xFD {
        1
    } else if value <= 0xFFFF {
        3
    } else if value <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

/// Returns the encoded size of a length-prefixed byte string.
pub fn var_bytes_size(len: usize) -> usize {
    var_int_size(len as u64) + len
}
