//! Main settlement engine
//!
//! Two-phase game economics on top of the ledger:
//!
//! 1. **Escrow**: take the entry fee (`game_entry`)
//! 2. **Settle**: apply the signed outcome (`win` / `loss`), bump the play
//!    counters on the account and advance the gaming statistics
//!
//! Each phase is one ledger operation ([`Ledger::record_entry_fee`],
//! [`Ledger::record_game`]), so the ledger entry, the counters and the
//! statistics are committed together or not at all. The engine adds the
//! outcome sign rule and holds no session state; `game_id` is an opaque
//! caller key.

use crate::{
    config::SettlementConfig,
    stats::StatsTracker,
    types::{EscrowReceipt, GameResult, SettlementReceipt},
    Error, Result,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use wallet_ledger::{GameContext, Ledger, UserId};

/// Settlement engine
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    /// Ledger core
    ledger: Arc<Ledger>,

    /// Statistics reader
    stats: StatsTracker,

    /// Configuration
    config: SettlementConfig,
}

impl SettlementEngine {
    /// Create new settlement engine over a shared ledger
    pub fn new(ledger: Arc<Ledger>, config: SettlementConfig) -> Self {
        let stats = StatsTracker::new(ledger.storage().clone());
        Self {
            ledger,
            stats,
            config,
        }
    }

    /// Underlying ledger
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Statistics tracker
    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Take the entry fee for `game_id`
    pub async fn escrow(
        &self,
        user_id: &UserId,
        game_id: &str,
        game_label: &str,
        entry_fee: Decimal,
    ) -> Result<EscrowReceipt> {
        let receipt = self
            .ledger
            .record_entry_fee(user_id, GameContext::entry(game_id, game_label), entry_fee)
            .await?;

        tracing::info!(
            user_id = %user_id,
            game_id = %game_id,
            entry_fee = %entry_fee,
            balance = %receipt.new_balance,
            "Entry fee escrowed"
        );

        Ok(EscrowReceipt {
            new_balance: receipt.new_balance,
            transaction: receipt.transaction,
            game_id: game_id.to_string(),
        })
    }

    /// Apply the outcome of `game_id` and advance the player's statistics
    #[allow(clippy::too_many_arguments)]
    pub async fn settle(
        &self,
        user_id: &UserId,
        game_id: &str,
        game_label: &str,
        result: GameResult,
        amount: Decimal,
        opponent: &str,
        duration: &str,
    ) -> Result<SettlementReceipt> {
        if self.config.enforce_outcome_sign && !result.admits(amount) {
            let error =
                Error::InvalidOutcome(format!("{} cannot carry amount {}", result, amount));
            self.ledger.metrics().record_rejection(error.kind());
            tracing::warn!(
                operation = "settle",
                kind = error.kind(),
                error = %error,
                "Operation rejected"
            );
            return Err(error);
        }

        let context = GameContext {
            game_id: game_id.to_string(),
            game_label: game_label.to_string(),
            opponent: Some(opponent.to_string()),
            duration: Some(duration.to_string()),
        };
        let receipt = self.ledger.record_game(user_id, context, result, amount).await?;

        tracing::info!(
            user_id = %user_id,
            game_id = %game_id,
            result = %result,
            amount = %amount,
            balance = %receipt.new_balance,
            streak = receipt.statistics.current_streak,
            "Game settled"
        );

        Ok(SettlementReceipt {
            new_balance: receipt.new_balance,
            transaction: receipt.transaction,
            gaming_stats: receipt.statistics,
        })
    }
}
