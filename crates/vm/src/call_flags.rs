//! Call flags for the Neo Virtual Machine.
//!
//! The capability bitmask granted to an executing context and required by
//! interop services and native methods.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Flags that control what operations a contract can perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallFlags: u8 {
        /// No flags.
        const NONE = 0;
        /// Allow reading states.
        const READ_STATES = 0b0000_0001;
        /// Allow writing states.
        const WRITE_STATES = 0b0000_0010;
        /// Allow calling other contracts.
        const ALLOW_CALL = 0b0000_0100;
        /// Allow sending notifications.
        const ALLOW_NOTIFY = 0b0000_1000;
        /// Allow reading and writing states.
        const STATES = Self::READ_STATES.bits() | Self::WRITE_STATES.bits();
        /// Allow reading states and calling other contracts.
        const READ_ONLY = Self::READ_STATES.bits() | Self::ALLOW_CALL.bits();
        /// Allow all operations.
        const ALL = Self::STATES.bits() | Self::ALLOW_CALL.bits() | Self::ALLOW_NOTIFY.bits();
    }
}

impl CallFlags {
    /// Whether every bit of `required` is granted.
    pub fn has_flag(&self, required: CallFlags) -> bool {
        self.contains(required)
    }

    /// Parses a raw value, rejecting bits outside [`CallFlags::ALL`].
    pub fn from_byte(value: u8) -> Option<Self> {
        Self::from_bits(value)
    }
}

impl Serialize for CallFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for CallFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        CallFlags::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid call flags: {bits:#04x}")))
    }
}
