use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain::{default_rewards, LedgerLimits, RewardDefinition};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub ledger: LedgerLimits,
    /// Reward definitions, validated when the catalog is loaded
    pub catalog: Vec<RewardDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            ledger: LedgerLimits::default(),
            catalog: default_rewards(),
        }
    }
}

impl AppConfig {
    /// Load the configuration from files and the environment
    ///
    /// Later sources override earlier ones:
    /// 1. `{REWARDS_CONFIG_DIR}/default.toml`
    /// 2. `{REWARDS_CONFIG_DIR}/{REWARDS_ENV}.toml`
    /// 3. `REWARDS__` environment variables, e.g. `REWARDS__LEDGER__MAX_BALANCE`
    ///
    /// `REWARDS_CONFIG_DIR` defaults to `config` and `REWARDS_ENV` to `development`. Missing
    /// files are skipped.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("REWARDS_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir =
            std::env::var("REWARDS_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        let config_dir = Path::new(&config_dir);

        Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{env}.toml"))).required(false))
            .add_source(
                Environment::with_prefix("REWARDS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Catalog, RarityTier};
    use speculoos::prelude::*;

    #[test]
    fn test_empty_uses_defaults() {
        let res = AppConfig::from_toml("");

        assert_that!(res).is_ok().is_equal_to(AppConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let res = AppConfig::from_toml(
            r#"
            [log]
            format = "json"

            [ledger]
            max_balance = 500
            "#,
        );

        assert_that!(res).is_ok().matches(|config| {
            config.log.format == LogFormat::Json
                && config.log.level == "info"
                && config.ledger.max_balance == 500
                && config.ledger.max_tx_amount == LedgerLimits::default().max_tx_amount
                && config.catalog == default_rewards()
        });
    }

    #[test]
    fn test_ledger_limits_rejected_for_catalog() {
        let config = AppConfig::from_toml(
            r#"
            [ledger]
            max_tx_amount = 500
            "#,
        )
        .unwrap();
        let catalog = Catalog::load(config.catalog).unwrap();

        // The Diamond awards more than a single transaction may carry
        assert_that!(config.ledger.validate(&catalog))
            .is_err()
            .matches(|err| matches!(err, crate::domain::Error::InvalidLimits(_)));
    }

    #[test]
    fn test_custom_catalog() {
        let config = AppConfig::from_toml(
            r#"
            [[catalog]]
            id = 7
            name = "Lucky Star"
            rarity_tier = "Epic"
            point_value = 300
            draw_probability = 1.0
            "#,
        )
        .unwrap();

        let catalog = Catalog::load(config.catalog).unwrap();
        assert_that!(catalog.items_by_tier(RarityTier::Epic)).has_length(1);
        assert_that!(catalog.get(7)).is_some();
    }

    #[test]
    fn test_shipped_default_file() {
        let config = AppConfig::from_toml(include_str!("../config/default.toml")).unwrap();

        assert_that!(config).is_equal_to(AppConfig::default());
    }
}
