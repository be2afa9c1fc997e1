//! Key-value store adapters
//!
//! The ledger only assumes exact-key `get`/`set`. Adapters that can write
//! several keys atomically override [`KvStore::write_batch`]; the default
//! writes entries one by one in the order given.
//!
//! - [`MemoryStore`] - `HashMap` behind a lock, batch applied under one write lock
//! - [`RocksStore`] - RocksDB `wallet` column family, batch is a RocksDB `WriteBatch`

use crate::{
    config::{RocksDBConfig, StorageBackend, StorageConfig},
    error::{Error, Result},
};
use parking_lot::RwLock;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Column family holding every wallet record
const CF_WALLET: &str = "wallet";

/// Durable mapping from string keys to encoded records
pub trait KvStore: Send + Sync {
    /// Read a value by exact key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value by exact key
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Write several entries, in order
    fn write_batch(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }
}

/// Open the adapter selected by configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Rocksdb => Ok(Arc::new(RocksStore::open(
            &config.data_dir,
            &config.rocksdb,
        )?)),
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn write_batch(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key, value);
        }
        Ok(())
    }
}

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<DB>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksStore {
    /// Open or create database
    pub fn open(path: &Path, tuning: &RocksDBConfig) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(tuning.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(tuning.max_write_buffer_number);
        db_opts.set_max_background_jobs(tuning.max_background_jobs);

        if tuning.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_WALLET,
            Self::cf_options_wallet(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB wallet store");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_wallet() -> Options {
        let mut opts = Options::default();
        // Records are read on every mutation, favour LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_WALLET)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_WALLET)))
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle()?;
        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let cf = self.cf_handle()?;
        self.db.put_cf(cf, key.as_bytes(), value)?;
        Ok(())
    }

    fn write_batch(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let cf = self.cf_handle()?;
        let mut batch = WriteBatch::default();
        for (key, value) in &entries {
            batch.put_cf(cf, key.as_bytes(), value);
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(keys = entries.len(), "Committed write batch");
        Ok(())
    }
}
