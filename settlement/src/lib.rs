//! GameToken Wallet Settlement
//!
//! Game economics and the request/response boundary on top of
//! [`wallet_ledger`].
//!
//! # Architecture
//!
//! A game session is settled in two phases, each one atomic per user:
//!
//! 1. **Escrow**: the entry fee is debited as a `game_entry` transaction
//! 2. **Settle**: the signed outcome is applied as `win` / `loss`, the
//!    account's play counters and the gaming statistics advance in the same
//!    commit
//!
//! Statistics have no write path of their own; they only move when a
//! settlement is recorded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_decimal::Decimal;
//! use wallet_ledger::{Ledger, UserId};
//! use wallet_settlement::{GameResult, SettlementConfig, SettlementEngine};
//!
//! #[tokio::main]
//! async fn main() -> wallet_settlement::Result<()> {
//!     let ledger = Arc::new(Ledger::open(wallet_ledger::Config::in_memory())?);
//!     let player = UserId::new("u-player");
//!     ledger.open_account(&player, "player", None).await?;
//!
//!     let engine = SettlementEngine::new(ledger, SettlementConfig::default());
//!     engine.escrow(&player, "g1", "Arena", Decimal::from(50)).await?;
//!     let receipt = engine
//!         .settle(&player, "g1", "Arena", GameResult::Win, Decimal::from(120), "Bob", "5:30")
//!         .await?;
//!
//!     println!("balance {}, streak {}", receipt.new_balance, receipt.gaming_stats.current_streak);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod stats;
pub mod types;

// Re-exports
pub use api::{ErrorBody, WalletEnvelope, WalletRequest, WalletResponse, WalletService};
pub use config::{Config, IdentityConfig, LeaderboardConfig, LoggingConfig, SettlementConfig};
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use identity::{IdentityProvider, StaticTokenIdentity};
pub use leaderboard::{LeaderboardSource, StaticLeaderboard};
pub use stats::StatsTracker;
pub use types::*;
