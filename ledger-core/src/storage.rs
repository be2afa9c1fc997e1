//! Typed record access over a [`KvStore`]
//!
//! # Key layout
//!
//! - `user:{id}` - [`Account`]
//! - `transactions:{id}` - `Vec<Transaction>`, newest first
//! - `gaming:{id}` - [`GamingStatistics`]
//! - `username:{name}` - [`UserId`] index for recipient lookup
//!
//! All three per-user records form one account unit. A unit is loaded,
//! mutated in memory and written back through a changeset; nothing reaches
//! the store unless the whole mutation succeeded. Units and changesets are
//! crate-private: the only public path to a write is a [`crate::Ledger`]
//! operation, which runs inside the user's scope.

use crate::{
    error::{Error, Result},
    kv::KvStore,
    types::{
        Account, GameContext, GameResult, GamingStatistics, Transaction, TransactionType, UserId,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use uuid::Uuid;

fn account_key(user_id: &UserId) -> String {
    format!("user:{}", user_id)
}

fn transactions_key(user_id: &UserId) -> String {
    format!("transactions:{}", user_id)
}

fn gaming_key(user_id: &UserId) -> String {
    format!("gaming:{}", user_id)
}

fn username_key(username: &str) -> String {
    format!("username:{}", username.to_lowercase())
}

/// Per-user aggregate: account, transaction log and gaming statistics
#[derive(Debug, Clone)]
pub(crate) struct AccountUnit {
    /// Balance and play counters
    pub(crate) account: Account,

    /// Transaction log, newest first
    pub(crate) transactions: Vec<Transaction>,

    /// Gaming aggregates
    pub(crate) statistics: GamingStatistics,
}

impl AccountUnit {
    /// Fresh unit for a newly opened account
    pub(crate) fn new(account: Account) -> Self {
        Self {
            account,
            transactions: Vec::new(),
            statistics: GamingStatistics::default(),
        }
    }

    /// Apply a signed delta and record it at the head of the log
    ///
    /// Fails with [`Error::InsufficientBalance`] when the resulting balance
    /// would be negative and with [`Error::InvalidAmount`] when it would
    /// overflow; the unit is untouched either way. Game context is only
    /// accepted on game transaction types.
    pub(crate) fn apply(
        &mut self,
        amount: Decimal,
        transaction_type: TransactionType,
        description: impl Into<String>,
        game: Option<GameContext>,
        history_limit: usize,
    ) -> Result<Transaction> {
        if game.is_some() && !transaction_type.is_game() {
            return Err(Error::InvalidRequest(format!(
                "{} transactions carry no game context",
                transaction_type
            )));
        }

        let new_balance = self.account.balance.checked_add(amount).ok_or_else(|| {
            Error::InvalidAmount(format!(
                "amount {} overflows balance {}",
                amount, self.account.balance
            ))
        })?;
        if new_balance < Decimal::ZERO {
            return Err(Error::InsufficientBalance {
                required: -amount,
                available: self.account.balance,
            });
        }

        self.account.balance = new_balance;
        self.account.transaction_count += 1;

        let transaction = Transaction {
            id: Uuid::now_v7(),
            sequence: self.account.transaction_count,
            transaction_type,
            amount,
            description: description.into(),
            timestamp: Utc::now(),
            balance_after: new_balance,
            game,
        };

        self.transactions.insert(0, transaction.clone());
        self.transactions.truncate(history_limit);

        Ok(transaction)
    }

    /// Record a settled game: ledger entry, play counters and statistics
    ///
    /// All three move together; on error the unit is untouched.
    pub(crate) fn settle_game(
        &mut self,
        context: GameContext,
        result: GameResult,
        amount: Decimal,
        history_limit: usize,
    ) -> Result<Transaction> {
        let statistics = self.statistics.with_outcome(result, amount)?;

        let verb = match result {
            GameResult::Win => "Won",
            GameResult::Loss => "Lost",
        };
        let description = format!(
            "{} against {} in {}",
            verb,
            context.opponent.as_deref().unwrap_or("unknown"),
            context.game_label
        );

        let transaction = self.apply(
            amount,
            result.transaction_type(),
            description,
            Some(context),
            history_limit,
        )?;

        self.account.games_played += 1;
        match result {
            GameResult::Win => self.account.total_wins += 1,
            GameResult::Loss => self.account.total_losses += 1,
        }
        self.statistics = statistics;

        Ok(transaction)
    }
}

/// Encoded writes collected for one commit
#[derive(Debug, Default)]
pub(crate) struct Changeset {
    logs: Vec<(String, Vec<u8>)>,
    statistics: Vec<(String, Vec<u8>)>,
    indices: Vec<(String, Vec<u8>)>,
    accounts: Vec<(String, Vec<u8>)>,
}

impl Changeset {
    /// Empty changeset
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stage every record of a unit
    pub(crate) fn put_unit(&mut self, unit: &AccountUnit) -> Result<()> {
        let user_id = &unit.account.user_id;
        self.logs
            .push((transactions_key(user_id), encode(&unit.transactions)?));
        self.statistics
            .push((gaming_key(user_id), encode(&unit.statistics)?));
        self.accounts.push((account_key(user_id), encode(&unit.account)?));
        Ok(())
    }

    /// Stage the username index entry for an account
    pub(crate) fn put_username(&mut self, username: &str, user_id: &UserId) -> Result<()> {
        self.indices.push((username_key(username), encode(user_id)?));
        Ok(())
    }

    /// Number of staged writes
    pub(crate) fn len(&self) -> usize {
        self.logs.len() + self.statistics.len() + self.indices.len() + self.accounts.len()
    }

    /// Whether nothing is staged
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes in commit order: logs, statistics, indices, accounts last
    fn into_entries(self) -> Vec<(String, Vec<u8>)> {
        let mut entries = self.logs;
        entries.extend(self.statistics);
        entries.extend(self.indices);
        entries.extend(self.accounts);
        entries
    }
}

/// Typed storage wrapper
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Wrap a KV adapter
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Get account by user ID
    pub fn get_account(&self, user_id: &UserId) -> Result<Account> {
        self.read(&account_key(user_id))?
            .ok_or_else(|| Error::NotFound(format!("account {}", user_id)))
    }

    /// Whether an account exists
    pub fn account_exists(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.store.get(&account_key(user_id))?.is_some())
    }

    /// Transaction log, newest first (empty if never written)
    pub fn get_transactions(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        Ok(self.read(&transactions_key(user_id))?.unwrap_or_default())
    }

    /// Gaming statistics (zeroed if never written)
    pub fn get_statistics(&self, user_id: &UserId) -> Result<GamingStatistics> {
        Ok(self.read(&gaming_key(user_id))?.unwrap_or_default())
    }

    /// Resolve a username through the index
    pub fn find_username(&self, username: &str) -> Result<Option<UserId>> {
        self.read(&username_key(username))
    }

    /// Load the full per-user unit
    pub(crate) fn load_unit(&self, user_id: &UserId) -> Result<AccountUnit> {
        let account = self.get_account(user_id)?;
        let transactions = self.get_transactions(user_id)?;
        let statistics = self.get_statistics(user_id)?;

        tracing::debug!(user_id = %user_id, log_len = transactions.len(), "Loaded account unit");

        Ok(AccountUnit {
            account,
            transactions,
            statistics,
        })
    }

    /// Write a changeset through the adapter
    pub(crate) fn commit(&self, changeset: Changeset) -> Result<()> {
        if changeset.is_empty() {
            return Ok(());
        }
        self.store.write_batch(changeset.into_entries())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn test_unit(balance: i64) -> AccountUnit {
        AccountUnit::new(Account::new(
            UserId::new("u1"),
            "alice",
            Some("alice@example.com".to_string()),
            Decimal::from(balance),
        ))
    }

    #[test]
    fn test_apply_prepends_and_snapshots_balance() {
        let mut unit = test_unit(100);

        let first = unit
            .apply(Decimal::from(-40), TransactionType::Sent, "Sent to bob", None, 100)
            .unwrap();
        let second = unit
            .apply(Decimal::from(15), TransactionType::Received, "From carol", None, 100)
            .unwrap();

        assert_eq!(unit.account.balance, Decimal::from(75));
        assert_eq!(first.balance_after, Decimal::from(60));
        assert_eq!(second.balance_after, Decimal::from(75));
        assert_eq!(unit.transactions[0].id, second.id);
        assert_eq!(unit.transactions[1].id, first.id);
        assert_eq!(second.sequence, 2);
    }

    #[test]
    fn test_apply_rejects_negative_balance_untouched() {
        let mut unit = test_unit(10);

        let err = unit
            .apply(Decimal::from(-11), TransactionType::Sent, "too much", None, 100)
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert_eq!(unit.account.balance, Decimal::from(10));
        assert!(unit.transactions.is_empty());
        assert_eq!(unit.account.transaction_count, 0);
    }

    #[test]
    fn test_apply_allows_draining_to_zero() {
        let mut unit = test_unit(10);
        unit.apply(Decimal::from(-10), TransactionType::GameEntry, "all in", None, 100)
            .unwrap();
        assert!(unit.account.balance.is_zero());
    }

    #[test]
    fn test_apply_rejects_game_context_on_transfer() {
        let mut unit = test_unit(10);
        let err = unit
            .apply(
                Decimal::from(-1),
                TransactionType::Sent,
                "odd",
                Some(GameContext::entry("g1", "Arena")),
                100,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(unit.account.transaction_count, 0);
    }

    #[test]
    fn test_apply_truncates_oldest() {
        let mut unit = test_unit(0);
        for _ in 0..5 {
            unit.apply(Decimal::ONE, TransactionType::Received, "drip", None, 3)
                .unwrap();
        }
        assert_eq!(unit.transactions.len(), 3);
        assert_eq!(unit.transactions[0].sequence, 5);
        assert_eq!(unit.transactions[2].sequence, 3);
    }

    #[test]
    fn test_commit_and_load_unit() {
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        let mut unit = test_unit(500);
        unit.apply(Decimal::from(-25), TransactionType::GameEntry, "Joined Arena", None, 100)
            .unwrap();
        unit.statistics.games_won = 2;

        let mut changeset = Changeset::new();
        changeset.put_unit(&unit).unwrap();
        changeset.put_username("Alice", &unit.account.user_id).unwrap();
        assert_eq!(changeset.len(), 4);
        storage.commit(changeset).unwrap();

        let loaded = storage.load_unit(&UserId::new("u1")).unwrap();
        assert_eq!(loaded.account, unit.account);
        assert_eq!(loaded.transactions, unit.transactions);
        assert_eq!(loaded.statistics.games_won, 2);
        assert_eq!(storage.find_username("alice").unwrap(), Some(UserId::new("u1")));
    }

    #[test]
    fn test_apply_rejects_balance_overflow_untouched() {
        let mut unit = test_unit(0);
        unit.apply(Decimal::MAX, TransactionType::Received, "jackpot", None, 100)
            .unwrap();

        let err = unit
            .apply(Decimal::MAX, TransactionType::Received, "again", None, 100)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidAmount(_)));
        assert_eq!(unit.account.balance, Decimal::MAX);
        assert_eq!(unit.account.transaction_count, 1);
        assert_eq!(unit.transactions.len(), 1);
    }

    #[test]
    fn test_settle_game_moves_counters_and_statistics() {
        let mut unit = test_unit(100);
        let mut context = GameContext::entry("g1", "Arena");
        context.opponent = Some("Bob".to_string());

        let tx = unit
            .settle_game(context, GameResult::Win, Decimal::from(30), 100)
            .unwrap();

        assert_eq!(tx.transaction_type, TransactionType::Win);
        assert_eq!(tx.description, "Won against Bob in Arena");
        assert_eq!(unit.account.balance, Decimal::from(130));
        assert_eq!(unit.account.games_played, 1);
        assert_eq!(unit.account.total_wins, 1);
        assert_eq!(unit.statistics.games_won, 1);
        assert_eq!(unit.statistics.current_streak, 1);
    }

    #[test]
    fn test_settle_game_failure_leaves_unit_untouched() {
        let mut unit = test_unit(0);
        unit.statistics.total_earnings = Decimal::MAX;
        let before = unit.clone();

        let err = unit
            .settle_game(
                GameContext::entry("g1", "Arena"),
                GameResult::Win,
                Decimal::ONE,
                100,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));

        let err = unit
            .settle_game(
                GameContext::entry("g2", "Arena"),
                GameResult::Loss,
                Decimal::from(-5),
                100,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));

        assert_eq!(unit.account, before.account);
        assert_eq!(unit.statistics, before.statistics);
        assert!(unit.transactions.is_empty());
    }

    /// Adapter relying on the default one-by-one `write_batch`
    #[derive(Default)]
    struct RecordingStore {
        written: parking_lot::Mutex<Vec<String>>,
    }

    impl KvStore for RecordingStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: Vec<u8>) -> Result<()> {
            self.written.lock().push(key.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_commit_writes_account_last() {
        let store = Arc::new(RecordingStore::default());
        let storage = Storage::new(store.clone());
        let unit = test_unit(500);

        let mut changeset = Changeset::new();
        changeset.put_unit(&unit).unwrap();
        changeset.put_username("alice", &unit.account.user_id).unwrap();
        storage.commit(changeset).unwrap();

        let written = store.written.lock().clone();
        assert_eq!(
            written,
            vec![
                "transactions:u1".to_string(),
                "gaming:u1".to_string(),
                "username:alice".to_string(),
                "user:u1".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_records() {
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        let user = UserId::new("ghost");

        assert!(matches!(storage.get_account(&user), Err(Error::NotFound(_))));
        assert!(storage.get_transactions(&user).unwrap().is_empty());
        assert_eq!(storage.get_statistics(&user).unwrap(), GamingStatistics::default());
        assert!(!storage.account_exists(&user).unwrap());
    }
}
