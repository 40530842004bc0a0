//! Parameter and return types declared in a contract ABI.

use std::fmt;
use std::str::FromStr;

/// Represents the type of a contract parameter.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContractParameterType {
    #[default]
    Any = 0x00,
    Boolean = 0x10,
    Integer = 0x11,
    ByteArray = 0x12,
    String = 0x13,
    Hash160 = 0x14,
    Hash256 = 0x15,
    PublicKey = 0x16,
    Signature = 0x17,
    Array = 0x20,
    Map = 0x22,
    InteropInterface = 0x30,
    /// Only valid as a return type: the method returns nothing.
    Void = 0xff,
}

impl ContractParameterType {
    /// The name used in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractParameterType::Any => "Any",
            ContractParameterType::Boolean => "Boolean",
            ContractParameterType::Integer => "Integer",
            ContractParameterType::ByteArray => "ByteArray",
            ContractParameterType::String => "String",
            ContractParameterType::Hash160 => "Hash160",
            ContractParameterType::Hash256 => "Hash256",
            ContractParameterType::PublicKey => "PublicKey",
            ContractParameterType::Signature => "Signature",
            ContractParameterType::Array => "Array",
            ContractParameterType::Map => "Map",
            ContractParameterType::InteropInterface => "InteropInterface",
            ContractParameterType::Void => "Void",
        }
    }
}

impl FromStr for ContractParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s {
            "Any" => ContractParameterType::Any,
            "Boolean" => ContractParameterType::Boolean,
            "Integer" => ContractParameterType::Integer,
            "ByteArray" => ContractParameterType::ByteArray,
            "String" => ContractParameterType::String,
            "Hash160" => ContractParameterType::Hash160,
            "Hash256" => ContractParameterType::Hash256,
            "PublicKey" => ContractParameterType::PublicKey,
            "Signature" => ContractParameterType::Signature,
            "Array" => ContractParameterType::Array,
            "Map" => ContractParameterType::Map,
            "InteropInterface" => ContractParameterType::InteropInterface,
            "Void" => ContractParameterType::Void,
            other => return Err(format!("unknown parameter type: {other}")),
        };
        Ok(value)
    }
}

impl fmt::Display for ContractParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ContractParameterType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ContractParameterType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <String as serde::Deserialize>::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for ty in [
            ContractParameterType::Any,
            ContractParameterType::Hash160,
            ContractParameterType::InteropInterface,
            ContractParameterType::Void,
        ] {
            assert_eq!(ty.as_str().parse::<ContractParameterType>().unwrap(), ty);
        }
        assert!("hash160".parse::<ContractParameterType>().is_err());
    }

    #[test]
    fn test_serde_as_name() {
        let json = serde_json::to_string(&ContractParameterType::ByteArray).unwrap();
        assert_eq!(json, "\"ByteArray\"");
        assert_eq!(ContractParameterType::ByteArray as u8, 0x12);
    }
}
