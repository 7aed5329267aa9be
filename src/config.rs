//! Engine configuration
//!
//! Bonus schedule, bet limits and storage location. Loaded from TOML with
//! every field defaulted, so an empty or missing file yields the standard
//! NetProphet rules.

use crate::odds::MultiplierConfig;
use crate::prediction::MatchFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite file backing the wager store
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Format assumed when a match does not state one
    #[serde(default)]
    pub default_format: MatchFormat,

    /// Count derived set winners toward the multiplier bonus
    #[serde(default)]
    pub count_derived_fields: bool,

    #[serde(default)]
    pub multiplier: MultiplierConfig,

    #[serde(default)]
    pub betting: BettingLimits,
}

fn default_database_path() -> String {
    "./netprophet.db".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_format: MatchFormat::default(),
            count_derived_fields: false,
            multiplier: MultiplierConfig::default(),
            betting: BettingLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `NETPROPHET_CONFIG` (default `netprophet.toml`), falling back
    /// to defaults. `DATABASE_PATH` overrides the file's database path.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let path =
            std::env::var("NETPROPHET_CONFIG").unwrap_or_else(|_| "netprophet.toml".to_string());

        let mut config = Self::load_or_default(&path);
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            config.database_path = db_path;
        }
        config
    }

    /// Load `path`, falling back to defaults. A missing file is expected; a
    /// file that exists but is rejected is logged as a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) if path.exists() => {
                tracing::warn!(
                    "Ignoring invalid engine config {}, using defaults: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            }
            Err(e) => {
                tracing::debug!("Using default engine config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.multiplier.validate()?;
        self.betting.validate()?;
        Ok(())
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Bet size limits, in coins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingLimits {
    #[serde(default = "default_min_bet")]
    pub min_bet: u64,

    #[serde(default = "default_max_bet")]
    pub max_bet: u64,

    /// Credited when a wallet is first seen
    #[serde(default)]
    pub starting_balance: u64,
}

fn default_min_bet() -> u64 {
    1
}

fn default_max_bet() -> u64 {
    1_000_000
}

impl Default for BettingLimits {
    fn default() -> Self {
        Self {
            min_bet: default_min_bet(),
            max_bet: default_max_bet(),
            starting_balance: 0,
        }
    }
}

impl BettingLimits {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_bet == 0 {
            anyhow::bail!("betting.min_bet must be at least 1 coin");
        }
        if self.max_bet > i64::MAX as u64 {
            anyhow::bail!("betting.max_bet ({}) exceeds {}", self.max_bet, i64::MAX);
        }
        if self.starting_balance > i64::MAX as u64 {
            anyhow::bail!(
                "betting.starting_balance ({}) exceeds {}",
                self.starting_balance,
                i64::MAX
            );
        }
        if self.max_bet < self.min_bet {
            anyhow::bail!(
                "betting.max_bet ({}) is below betting.min_bet ({})",
                self.max_bet,
                self.min_bet
            );
        }
        Ok(())
    }

    pub fn allows(&self, amount: u64) -> bool {
        amount >= self.min_bet && amount <= self.max_bet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.multiplier, MultiplierConfig::default());
        assert_eq!(config.betting.min_bet, 1);
        assert_eq!(config.database_path, "./netprophet.db");
        assert_eq!(config.default_format, MatchFormat::Standard);
        assert!(!config.count_derived_fields);
    }

    #[test]
    fn test_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            default_format = "amateur_super_tiebreak"

            [betting]
            max_bet = 500
            starting_balance = 1000

            [[multiplier.tiers]]
            min_predictions = 3
            bonus = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.default_format, MatchFormat::AmateurSuperTiebreak);
        assert_eq!(config.betting.min_bet, 1);
        assert_eq!(config.betting.max_bet, 500);
        assert_eq!(config.multiplier.tiers.len(), 1);
        assert_eq!(config.multiplier.bonus_for(3), 0.25);
        assert_eq!(config.multiplier.bonus_for(2), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = EngineConfig::default();
        config.betting.starting_balance = 250;
        config.save(file.path()).unwrap();

        let loaded = EngineConfig::load(file.path()).unwrap();
        assert_eq!(loaded.betting.starting_balance, 250);
        assert_eq!(loaded.multiplier, config.multiplier);
    }

    #[test]
    fn test_rejected_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[multiplier.tiers]]\nmin_predictions = 2\nbonus = 0.2\n\n\
             [[multiplier.tiers]]\nmin_predictions = 4\nbonus = 0.1"
        )
        .unwrap();

        assert!(EngineConfig::load(file.path()).is_err());
        let config = EngineConfig::load_or_default(file.path());
        assert_eq!(config.multiplier, MultiplierConfig::default());

        let missing = file.path().with_extension("missing.toml");
        let config = EngineConfig::load_or_default(&missing);
        assert_eq!(config.betting.max_bet, 1_000_000);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let limits = BettingLimits {
            min_bet: 10,
            max_bet: 5,
            starting_balance: 0,
        };
        assert!(limits.validate().is_err());

        let unbounded = BettingLimits {
            max_bet: u64::MAX,
            ..BettingLimits::default()
        };
        assert!(unbounded.validate().is_err());
        let storable = BettingLimits {
            max_bet: i64::MAX as u64,
            ..BettingLimits::default()
        };
        assert!(storable.validate().is_ok());

        assert!(BettingLimits::default().allows(1));
        assert!(!BettingLimits::default().allows(0));
    }
}
