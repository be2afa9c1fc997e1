//! Configuration for the wallet service

use crate::types::LeaderboardEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wallet service configuration
///
/// Ledger sections (`storage`, `ledger`) are flattened in, so one TOML file
/// configures the whole service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger and store configuration
    #[serde(flatten)]
    pub ledger: wallet_ledger::Config,

    /// Settlement rules
    pub settlement: SettlementConfig,

    /// Bundled identity provider
    pub identity: IdentityConfig,

    /// Bundled leaderboard source
    pub leaderboard: LeaderboardConfig,

    /// Log output
    pub logging: LoggingConfig,
}

/// Settlement rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Reject a `win` with a negative amount and a `loss` with a positive one
    pub enforce_outcome_sign: bool,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            enforce_outcome_sign: true,
        }
    }
}

/// Static bearer token table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Bearer token -> user id
    pub tokens: HashMap<String, String>,
}

/// Precomputed leaderboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Entries in rank order
    pub entries: Vec<LeaderboardEntry>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// In-memory configuration, handy for tests
    pub fn in_memory() -> Self {
        Self {
            ledger: wallet_ledger::Config::in_memory(),
            ..Default::default()
        }
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.ledger.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `WALLET_*` environment variables
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.ledger.apply_env()?;

        if let Ok(level) = std::env::var("WALLET_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var("WALLET_LOG_JSON") {
            self.logging.json = parse_flag("WALLET_LOG_JSON", &json)?;
        }

        if let Ok(enforce) = std::env::var("WALLET_ENFORCE_OUTCOME_SIGN") {
            self.settlement.enforce_outcome_sign =
                parse_flag("WALLET_ENFORCE_OUTCOME_SIGN", &enforce)?;
        }

        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> crate::Result<bool> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(crate::Error::Config(format!("{}: expected a boolean, got {}", name, other))),
    }
}
