//! Core types for the settlement engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wallet_ledger::{GamingStatistics, Transaction};

pub use wallet_ledger::GameResult;

/// Result of an entry-fee escrow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowReceipt {
    /// Balance after the fee was taken
    pub new_balance: Decimal,

    /// Recorded `game_entry` transaction
    pub transaction: Transaction,

    /// Session the fee was taken for
    pub game_id: String,
}

/// Result of a settled game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// Balance after the payout or loss
    pub new_balance: Decimal,

    /// Recorded `win` / `loss` transaction
    pub transaction: Transaction,

    /// Statistics after the update
    pub gaming_stats: GamingStatistics,
}

/// One precomputed leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,

    /// Display name
    pub username: String,

    /// Lifetime winnings
    pub winnings: Decimal,

    /// Games won
    pub games_won: u64,
}
