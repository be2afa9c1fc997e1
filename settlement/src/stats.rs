//! Gaming statistics tracker
//!
//! Statistics are derived state. They are readable here and advanced only by
//! [`wallet_ledger::Ledger::record_game`], inside the same per-user scope and
//! commit that records the `win` / `loss` entry.

use wallet_ledger::{GamingStatistics, Storage, UserId};

/// Read access to per-user gaming statistics
#[derive(Debug, Clone)]
pub struct StatsTracker {
    storage: Storage,
}

impl StatsTracker {
    /// Tracker over the ledger's storage
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Statistics for `user_id`, all zero when nothing was ever settled
    pub fn get(&self, user_id: &UserId) -> wallet_ledger::Result<GamingStatistics> {
        self.storage.get_statistics(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wallet_ledger::MemoryStore;

    #[test]
    fn test_get_defaults_to_zero() {
        let tracker = StatsTracker::new(Storage::new(Arc::new(MemoryStore::new())));
        let stats = tracker.get(&UserId::new("nobody")).unwrap();
        assert_eq!(stats, GamingStatistics::default());
    }
}
