//! Leaderboard collaborator
//!
//! Ranking is computed elsewhere; the wallet only serves the list it is given.

use crate::{config::LeaderboardConfig, types::LeaderboardEntry, Result};

/// Supplies a precomputed, ordered leaderboard
pub trait LeaderboardSource: Send + Sync {
    /// Entries in rank order
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>>;
}

/// Leaderboard fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticLeaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl StaticLeaderboard {
    /// Source serving `entries`, sorted by rank
    pub fn new(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by_key(|entry| entry.rank);
        Self { entries }
    }

    /// Source serving the configured entries
    pub fn from_config(config: &LeaderboardConfig) -> Self {
        Self::new(config.entries.clone())
    }
}

impl LeaderboardSource for StaticLeaderboard {
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        Ok(self.entries.clone())
    }
}
