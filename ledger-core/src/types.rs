//! Core records of the wallet ledger
//!
//! All records are designed for:
//! - Deterministic serialization (bincode in the store, JSON at the boundary)
//! - Exact arithmetic (Decimal for token amounts)
//! - Round-tripping every field, including signed amounts and balance snapshots

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable user identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a user ID, rejecting blank identifiers
    pub fn parse(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(crate::Error::InvalidRequest(
                "user id must not be blank".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of ledger-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Tokens sent to another user or address
    Sent,
    /// Tokens received from another user
    Received,
    /// Game won
    Win,
    /// Game lost
    Loss,
    /// Entry fee paid to join a game
    GameEntry,
}

impl TransactionType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sent => "sent",
            TransactionType::Received => "received",
            TransactionType::Win => "win",
            TransactionType::Loss => "loss",
            TransactionType::GameEntry => "game_entry",
        }
    }

    /// Whether this type belongs to a game session
    pub fn is_game(&self) -> bool {
        matches!(
            self,
            TransactionType::Win | TransactionType::Loss | TransactionType::GameEntry
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a finished game, as reported by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// Player won; amount is the payout
    Win,
    /// Player lost; amount is the (negative) loss
    Loss,
}

impl GameResult {
    /// Transaction type recorded for this outcome
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            GameResult::Win => TransactionType::Win,
            GameResult::Loss => TransactionType::Loss,
        }
    }

    /// Label used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::Win => "win",
            GameResult::Loss => "loss",
        }
    }

    /// Whether `amount` has the sign this outcome implies (zero fits both)
    pub fn admits(&self, amount: Decimal) -> bool {
        match self {
            GameResult::Win => amount >= Decimal::ZERO,
            GameResult::Loss => amount <= Decimal::ZERO,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game session details attached to game transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameContext {
    /// Caller-chosen session key
    pub game_id: String,
    /// Display name of the game
    pub game_label: String,
    /// Opponent reference (settlement only)
    pub opponent: Option<String>,
    /// Free-form duration label, e.g. "5:30" (settlement only)
    pub duration: Option<String>,
}

impl GameContext {
    /// Context for an entry fee
    pub fn entry(game_id: impl Into<String>, game_label: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            game_label: game_label.into(),
            opponent: None,
            duration: None,
        }
    }
}

/// Immutable record of one ledger-affecting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique ID (UUIDv7, time-ordered)
    pub id: Uuid,

    /// Per-account position, starts at 1 and never repeats
    pub sequence: u64,

    /// Event kind
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Signed delta applied to the balance
    pub amount: Decimal,

    /// Human-readable label
    pub description: String,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Balance snapshot immediately after this transaction
    pub balance_after: Decimal,

    /// Game session details for win/loss/game_entry
    pub game: Option<GameContext>,
}

/// Per-user balance and play-count aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Primary key
    pub user_id: UserId,

    /// Display name, unique across accounts
    pub username: String,

    /// Contact email
    pub email: Option<String>,

    /// Token balance, never negative
    pub balance: Decimal,

    /// Settled games
    pub games_played: u64,

    /// Settled wins
    pub total_wins: u64,

    /// Settled losses
    pub total_losses: u64,

    /// Transactions ever recorded (including ones trimmed from the log)
    pub transaction_count: u64,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Fresh account holding the starting balance
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        email: Option<String>,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            email,
            balance: starting_balance,
            games_played: 0,
            total_wins: 0,
            total_losses: 0,
            transaction_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Derived gaming aggregates, advanced only by settlement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamingStatistics {
    /// Games won
    pub games_won: u64,

    /// Games lost
    pub games_lost: u64,

    /// Sum of positive settlement amounts
    pub total_earnings: Decimal,

    /// Sum of |negative settlement amounts|
    pub total_loss_amount: Decimal,

    /// Consecutive wins since the last loss
    pub current_streak: u32,

    /// Longest streak observed
    pub best_streak: u32,
}

impl GamingStatistics {
    /// `current_streak <= best_streak`
    pub fn is_consistent(&self) -> bool {
        self.current_streak <= self.best_streak
    }

    /// Statistics after one more settled game; `self` is left as it was
    ///
    /// A win adds `amount` to the earnings and extends the streak, a loss adds
    /// `|amount|` to the loss total and resets it. Fails with
    /// [`crate::Error::InvalidAmount`] when a total would overflow.
    pub(crate) fn with_outcome(&self, result: GameResult, amount: Decimal) -> crate::Result<Self> {
        let overflow = || {
            crate::Error::InvalidAmount(format!("{} amount {} overflows statistics", result, amount))
        };
        let mut next = self.clone();
        match result {
            GameResult::Win => {
                next.games_won += 1;
                next.total_earnings = next
                    .total_earnings
                    .checked_add(amount)
                    .ok_or_else(overflow)?;
                next.current_streak = next.current_streak.saturating_add(1);
                next.best_streak = next.best_streak.max(next.current_streak);
            }
            GameResult::Loss => {
                next.games_lost += 1;
                next.total_loss_amount = next
                    .total_loss_amount
                    .checked_add(amount.abs())
                    .ok_or_else(overflow)?;
                next.current_streak = 0;
            }
        }
        Ok(next)
    }
}
