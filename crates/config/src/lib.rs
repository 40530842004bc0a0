//! Neo Configuration Module
//!
//! Protocol settings and the fixed limits shared by the contract runtime.

mod hardfork;
mod protocol_settings;

pub use hardfork::{Hardfork, HardforkParseError};
pub use protocol_settings::{ConfigError, NetworkType, ProtocolSettings};

/// Size of an address (UInt160) in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Maximum size of a storage key in bytes.
pub const MAX_STORAGE_KEY_SIZE: usize = 64;

/// Maximum size of a storage value in bytes.
pub const MAX_STORAGE_VALUE_SIZE: usize = u16::MAX as usize;

/// Maximum length of a notification event name.
pub const MAX_EVENT_NAME: usize = 32;

/// Maximum serialized size of a notification state.
pub const MAX_NOTIFICATION_SIZE: usize = 1024;

/// Maximum length of a contract manifest in bytes.
pub const MAX_MANIFEST_LENGTH: usize = u16::MAX as usize;

/// One GAS expressed in datoshi.
pub const GAS_FACTOR: i64 = 1_0000_0000;

/// Default policy values seeded at genesis.
pub mod policy {
    /// The default execution fee factor.
    pub const DEFAULT_EXEC_FEE_FACTOR: u32 = 30;
    /// The default storage price.
    pub const DEFAULT_STORAGE_PRICE: u32 = 100_000;
    /// The default network fee per transaction byte.
    pub const DEFAULT_FEE_PER_BYTE: u32 = 1000;
    /// The maximum execution fee factor the committee can set.
    pub const MAX_EXEC_FEE_FACTOR: u32 = 100;
    /// The maximum storage price the committee can set.
    pub const MAX_STORAGE_PRICE: u32 = 10_000_000;
    /// The default minimum deployment fee (10 GAS).
    pub const DEFAULT_MINIMUM_DEPLOYMENT_FEE: i64 = 10 * super::GAS_FACTOR;
}
