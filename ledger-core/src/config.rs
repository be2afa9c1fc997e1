//! Configuration for the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Store configuration
    pub storage: StorageConfig,

    /// Ledger rules
    pub ledger: LedgerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "wallet-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Which KV adapter backs the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local map (tests, demos)
    Memory,
    /// Durable RocksDB database
    Rocksdb,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Adapter selection
    pub backend: StorageBackend,

    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// RocksDB tuning
    pub rocksdb: RocksDBConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rocksdb,
            data_dir: PathBuf::from("./data/wallet"),
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Ledger rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance granted on account opening
    pub starting_balance: Decimal,

    /// Transactions retained per account (newest first)
    pub history_limit: usize,

    /// Accept transfers to references that resolve to no account (one-sided debit)
    pub allow_external_recipients: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::from(1000),
            history_limit: 100,
            allow_external_recipients: false,
        }
    }
}

impl Config {
    /// In-memory configuration, handy for tests
    pub fn in_memory() -> Self {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
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
        if let Ok(data_dir) = std::env::var("WALLET_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(backend) = std::env::var("WALLET_STORAGE_BACKEND") {
            self.storage.backend = match backend.as_str() {
                "memory" => StorageBackend::Memory,
                "rocksdb" => StorageBackend::Rocksdb,
                other => {
                    return Err(crate::Error::Config(format!(
                        "Unknown storage backend: {}",
                        other
                    )))
                }
            };
        }

        if let Ok(balance) = std::env::var("WALLET_STARTING_BALANCE") {
            self.ledger.starting_balance = balance
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid starting balance: {}", e)))?;
        }

        if let Ok(limit) = std::env::var("WALLET_HISTORY_LIMIT") {
            self.ledger.history_limit = limit
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid history limit: {}", e)))?;
        }

        self.validate()
    }

    /// Reject configurations the ledger cannot honour
    pub fn validate(&self) -> crate::Result<()> {
        if self.ledger.starting_balance.is_sign_negative() {
            return Err(crate::Error::Config(
                "starting_balance must not be negative".to_string(),
            ));
        }
        if self.ledger.history_limit == 0 {
            return Err(crate::Error::Config(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
