//! Configuration for settlement planning

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Optimizer tuning
    pub optimizer: OptimizerConfig,
}

/// Optimizer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Balances within this distance of zero count as settled
    pub epsilon: Decimal,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            epsilon: Decimal::new(1, 2), // one cent
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.optimizer.epsilon, Decimal::new(1, 2));
    }
}
