//! Configuration for the trip ledger

use crate::types::RemovalPolicyVersion;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Currency label assigned to trips that do not specify one
    pub default_currency: String,

    /// Input validation limits
    pub validation: ValidationConfig,

    /// Member removal policy defaults
    pub removal: RemovalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "ledger-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            default_currency: "USD".to_string(),
            validation: ValidationConfig::default(),
            removal: RemovalConfig::default(),
        }
    }
}

/// Input validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum expense/activity title length
    pub max_title_length: usize,

    /// Maximum single-expense amount
    pub max_amount: Decimal,

    /// Maximum splits per expense
    pub max_splits_per_expense: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_title_length: 200,
            max_amount: Decimal::new(100_000_000, 2), // 1,000,000.00
            max_splits_per_expense: 100,
        }
    }
}

/// Member removal policy defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Policy version assigned to newly created trips
    pub default_policy: RemovalPolicyVersion,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            // New trips get the component-split policy; existing trips keep
            // the version stored in their settings
            default_policy: RemovalPolicyVersion::SplitBalance,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(currency) = std::env::var("TRIPTAB_DEFAULT_CURRENCY") {
            config.default_currency = currency;
        }

        if let Ok(name) = std::env::var("TRIPTAB_SERVICE_NAME") {
            config.service_name = name;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "ledger-core");
        assert_eq!(config.default_currency, "USD");
        assert_eq!(
            config.removal.default_policy,
            RemovalPolicyVersion::SplitBalance
        );
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.validation.max_title_length, 200);
        assert_eq!(parsed.validation.max_amount, config.validation.max_amount);
    }
}
