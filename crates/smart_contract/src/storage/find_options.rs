//! Options of `System.Storage.Find`.

use crate::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Specify the options to be used during the search.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FindOptions: u8 {
        /// No option is set. The results will be an iterator of (key, value).
        const NONE = 0;

        /// Indicates that only keys need to be returned.
        const KEYS_ONLY = 1 << 0;

        /// Indicates that the prefix of keys should be removed before return.
        const REMOVE_PREFIX = 1 << 1;

        /// Indicates that only values need to be returned.
        const VALUES_ONLY = 1 << 2;

        /// Indicates that values should be deserialized before return.
        const DESERIALIZE_VALUES = 1 << 3;

        /// Indicates that only the field 0 of the deserialized values need to be returned.
        /// This flag must be set together with DESERIALIZE_VALUES.
        const PICK_FIELD0 = 1 << 4;

        /// Indicates that only the field 1 of the deserialized values need to be returned.
        /// This flag must be set together with DESERIALIZE_VALUES.
        const PICK_FIELD1 = 1 << 5;

        /// Indicates that results should be returned in descending key order.
        const BACKWARDS = 1 << 7;

        /// Every defined option.
        const ALL = Self::KEYS_ONLY.bits()
            | Self::REMOVE_PREFIX.bits()
            | Self::VALUES_ONLY.bits()
            | Self::DESERIALIZE_VALUES.bits()
            | Self::PICK_FIELD0.bits()
            | Self::PICK_FIELD1.bits()
            | Self::BACKWARDS.bits();
    }
}

impl FindOptions {
    /// Parses a raw option byte and rejects inconsistent combinations.
    pub fn parse(value: u8) -> Result<Self> {
        let options = Self::from_bits(value)
            .ok_or_else(|| Error::argument(format!("unknown find options: {value:#04x}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(self) -> Result<()> {
        let conflicts = [
            (
                Self::KEYS_ONLY,
                Self::VALUES_ONLY
                    | Self::DESERIALIZE_VALUES
                    | Self::PICK_FIELD0
                    | Self::PICK_FIELD1,
            ),
            (Self::VALUES_ONLY, Self::KEYS_ONLY | Self::REMOVE_PREFIX),
            (Self::PICK_FIELD0, Self::PICK_FIELD1),
        ];
        for (flag, excluded) in conflicts {
            if self.contains(flag) && self.intersects(excluded) {
                return Err(Error::argument(format!(
                    "find options {:?} conflict with {:?}",
                    flag,
                    self & excluded
                )));
            }
        }
        if self.intersects(Self::PICK_FIELD0 | Self::PICK_FIELD1)
            && !self.contains(Self::DESERIALIZE_VALUES)
        {
            return Err(Error::argument(
                "PickField0 and PickField1 require DeserializeValues",
            ));
        }
        Ok(())
    }
}
