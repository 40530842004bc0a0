//! Protocol settings loaded from TOML.

use crate::hardfork::Hardfork;
use crate::policy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Network type for Neo blockchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NetworkType {
    MainNet,
    #[default]
    TestNet,
    Private,
}

impl NetworkType {
    /// Gets the network magic number
    pub fn magic(&self) -> u32 {
        match self {
            NetworkType::MainNet => 0x334f454e,
            NetworkType::TestNet => 0x3254334e,
            NetworkType::Private => 0x00000000,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::MainNet => write!(f, "mainnet"),
            NetworkType::TestNet => write!(f, "testnet"),
            NetworkType::Private => write!(f, "private"),
        }
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(NetworkType::MainNet),
            "testnet" | "test" => Ok(NetworkType::TestNet),
            "private" | "privnet" => Ok(NetworkType::Private),
            _ => Err(format!("Unknown network type: {}", s)),
        }
    }
}

/// Settings that every node of a network must agree on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    pub network: NetworkType,
    /// Activation height per hardfork, keyed by hardfork name.
    pub hardforks: BTreeMap<String, u32>,
    /// Committee address as a `0x`-prefixed big-endian hex string.
    pub committee: Option<String>,
    pub initial_exec_fee_factor: u32,
    pub initial_storage_price: u32,
    pub initial_fee_per_byte: u32,
    pub minimum_deployment_fee: i64,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            network: NetworkType::Private,
            hardforks: Hardfork::ALL
                .into_iter()
                .map(|hf| (hf.as_str().to_string(), 0))
                .collect(),
            committee: None,
            initial_exec_fee_factor: policy::DEFAULT_EXEC_FEE_FACTOR,
            initial_storage_price: policy::DEFAULT_STORAGE_PRICE,
            initial_fee_per_byte: policy::DEFAULT_FEE_PER_BYTE,
            minimum_deployment_fee: policy::DEFAULT_MINIMUM_DEPLOYMENT_FEE,
        }
    }
}

impl ProtocolSettings {
    /// Parses settings from a TOML document. Unspecified fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: ProtocolSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in self.hardforks.keys() {
            Hardfork::from_str(name).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.initial_exec_fee_factor == 0
            || self.initial_exec_fee_factor > policy::MAX_EXEC_FEE_FACTOR
        {
            return Err(ConfigError::Invalid(format!(
                "initial_exec_fee_factor out of range: {}",
                self.initial_exec_fee_factor
            )));
        }
        if self.initial_storage_price == 0
            || self.initial_storage_price > policy::MAX_STORAGE_PRICE
        {
            return Err(ConfigError::Invalid(format!(
                "initial_storage_price out of range: {}",
                self.initial_storage_price
            )));
        }
        if self.minimum_deployment_fee < 0 {
            return Err(ConfigError::Invalid(
                "minimum_deployment_fee must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Activation height of a hardfork, if configured.
    pub fn hardfork_height(&self, hardfork: Hardfork) -> Option<u32> {
        self.hardforks.get(hardfork.as_str()).copied()
    }

    /// Whether `hardfork` is active at block `index`. Unconfigured hardforks are inactive.
    pub fn is_hardfork_enabled(&self, hardfork: Hardfork, index: u32) -> bool {
        self.hardfork_height(hardfork)
            .map(|height| index >= height)
            .unwrap_or(false)
    }
}
