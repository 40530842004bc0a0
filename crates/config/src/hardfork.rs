//! Hardfork identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents a hardfork of the protocol, in activation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hardfork {
    #[serde(rename = "HF_Aspidochelone")]
    Aspidochelone,
    #[serde(rename = "HF_Basilisk")]
    Basilisk,
    #[serde(rename = "HF_Cockatrice")]
    Cockatrice,
    #[serde(rename = "HF_Domovoi")]
    Domovoi,
}

/// Error returned when a hardfork name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hardfork: {0}")]
pub struct HardforkParseError(pub String);

impl Hardfork {
    /// All known hardforks in activation order.
    pub const ALL: [Hardfork; 4] = [
        Hardfork::Aspidochelone,
        Hardfork::Basilisk,
        Hardfork::Cockatrice,
        Hardfork::Domovoi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hardfork::Aspidochelone => "HF_Aspidochelone",
            Hardfork::Basilisk => "HF_Basilisk",
            Hardfork::Cockatrice => "HF_Cockatrice",
            Hardfork::Domovoi => "HF_Domovoi",
        }
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hardfork {
    type Err = HardforkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("HF_").unwrap_or(s);
        Hardfork::ALL
            .into_iter()
            .find(|hf| hf.as_str()[3..].eq_ignore_ascii_case(name))
            .ok_or_else(|| HardforkParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix() {
        assert_eq!("HF_Basilisk".parse::<Hardfork>().unwrap(), Hardfork::Basilisk);
        assert_eq!("domovoi".parse::<Hardfork>().unwrap(), Hardfork::Domovoi);
        assert!("HF_Unknown".parse::<Hardfork>().is_err());
    }

    #[test]
    fn test_ordering_follows_activation() {
        assert!(Hardfork::Aspidochelone < Hardfork::Basilisk);
        assert!(Hardfork::Cockatrice < Hardfork::Domovoi);
    }
}
