//! GameToken Wallet Ledger
//!
//! Per-user token ledger over a plain key-value store.
//!
//! # Architecture
//!
//! - **Per-user unit**: account, transaction log and gaming statistics of one
//!   user are loaded, mutated and committed together
//! - **Per-user scopes**: mutations for the same user never interleave; scopes
//!   spanning two users are taken in id order
//! - **Collect, then commit**: changes are staged in memory and written in one
//!   batch only after every step succeeded
//! - **Pluggable store**: in-memory map or RocksDB behind [`KvStore`]
//!
//! # Invariants
//!
//! - Balance is never negative
//! - `balance == starting balance + Σ(committed transaction amounts)`
//! - The log is newest first and holds at most `history_limit` entries
//! - Transaction ids never collide (UUIDv7 plus per-account sequence)

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod directory;
pub mod error;
pub mod kv;
pub mod ledger;
pub mod locks;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::{Config, LedgerConfig, StorageBackend};
pub use directory::{AccountDirectory, RecipientResolver};
pub use error::{Error, Result};
pub use kv::{KvStore, MemoryStore, RocksStore};
pub use ledger::{GameReceipt, Ledger, LedgerReceipt, TransferReceipt};
pub use metrics::Metrics;
pub use storage::Storage;
pub use types::{
    Account, GameContext, GameResult, GamingStatistics, Transaction, TransactionType, UserId,
};
