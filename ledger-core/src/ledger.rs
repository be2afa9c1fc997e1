//! Ledger engine
//!
//! Owns one account unit per user and implements account opening,
//! credit/debit, peer-to-peer transfers and game bookkeeping on top of typed
//! [`Storage`]. These operations are the only write paths: balances and
//! gaming statistics cannot be changed any other way.
//!
//! Every mutation follows the same discipline:
//!
//! 1. Enter the user's scope ([`UserLocks`]), or both users' scopes in id order
//! 2. Load the unit(s) from the store
//! 3. Mutate in memory; any error aborts here with nothing written
//! 4. Stage the unit(s) in one changeset and commit
//!
//! # Example
//!
//! ```no_run
//! use wallet_ledger::{Config, Ledger, TransactionType, UserId};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> wallet_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::in_memory())?;
//!     let alice = UserId::new("u-alice");
//!     ledger.open_account(&alice, "alice", None).await?;
//!
//!     let receipt = ledger
//!         .credit_or_debit(&alice, Decimal::from(-50), TransactionType::Sent, "coffee")
//!         .await?;
//!     assert_eq!(receipt.new_balance, Decimal::from(950));
//!     Ok(())
//! }
//! ```

use crate::{
    config::{Config, LedgerConfig},
    directory::{AccountDirectory, RecipientResolver},
    kv::{open_store, KvStore},
    locks::UserLocks,
    metrics::Metrics,
    storage::{AccountUnit, Changeset, Storage},
    types::{
        Account, GameContext, GameResult, GamingStatistics, Transaction, TransactionType, UserId,
    },
    Error, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Outcome of a committed balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    /// Balance after the change
    pub new_balance: Decimal,

    /// Recorded transaction
    pub transaction: Transaction,
}

/// Outcome of a committed transfer, seen from the sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    /// Sender balance after the transfer
    pub new_balance: Decimal,

    /// Sender's `sent` transaction
    pub transaction: Transaction,

    /// Credited account, `None` for an external recipient
    pub recipient_id: Option<UserId>,
}

/// Outcome of a committed game settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReceipt {
    /// Balance after the payout or loss
    pub new_balance: Decimal,

    /// Recorded `win` / `loss` transaction
    pub transaction: Transaction,

    /// Statistics after the update
    pub statistics: GamingStatistics,
}

/// Main ledger interface
pub struct Ledger {
    storage: Storage,
    locks: UserLocks,
    registration: Mutex<()>,
    resolver: Arc<dyn RecipientResolver>,
    metrics: Metrics,
    config: Config,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("storage", &self.storage)
            .field("ledger", &self.config.ledger)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Open ledger with the store selected by configuration
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = open_store(&config.storage)?;
        Self::with_store(store, config)
    }

    /// Build a ledger over an already constructed store adapter
    pub fn with_store(store: Arc<dyn KvStore>, config: Config) -> Result<Self> {
        config.validate()?;
        let storage = Storage::new(store);
        let resolver = Arc::new(AccountDirectory::new(storage.clone()));
        let metrics = Metrics::new().map_err(|e| Error::Config(format!("metrics: {}", e)))?;

        tracing::info!(
            service = %config.service_name,
            backend = ?config.storage.backend,
            history_limit = config.ledger.history_limit,
            "Ledger opened"
        );

        Ok(Self {
            storage,
            locks: UserLocks::new(),
            registration: Mutex::new(()),
            resolver,
            metrics,
            config,
        })
    }

    /// Replace the recipient resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn RecipientResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Typed storage (reads)
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Ledger rules
    pub fn rules(&self) -> &LedgerConfig {
        &self.config.ledger
    }

    /// Create an account holding the starting balance
    pub async fn open_account(
        &self,
        user_id: &UserId,
        username: &str,
        email: Option<String>,
    ) -> Result<Account> {
        let started = Instant::now();
        let result = self.open_account_inner(user_id, username, email).await;
        self.observe("open_account", started, result)
    }

    async fn open_account_inner(
        &self,
        user_id: &UserId,
        username: &str,
        email: Option<String>,
    ) -> Result<Account> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidRequest("username must not be blank".to_string()));
        }

        let _registration = self.registration.lock().await;
        let _scope = self.locks.lock(user_id).await;

        if self.storage.account_exists(user_id)? {
            return Err(Error::AccountExists(user_id.to_string()));
        }
        if self.storage.find_username(username)?.is_some() {
            return Err(Error::AccountExists(format!("username {}", username)));
        }

        let account = Account::new(
            user_id.clone(),
            username,
            email,
            self.config.ledger.starting_balance,
        );
        let unit = AccountUnit::new(account.clone());

        let mut changeset = Changeset::new();
        changeset.put_unit(&unit)?;
        changeset.put_username(username, user_id)?;
        self.storage.commit(changeset)?;

        tracing::info!(
            user_id = %user_id,
            username = %username,
            balance = %account.balance,
            "Account opened"
        );

        Ok(account)
    }

    /// Get account by user ID
    pub fn get_account(&self, user_id: &UserId) -> Result<Account> {
        self.storage.get_account(user_id)
    }

    /// Transaction history, newest first, capped at `limit` and the retention bound
    pub fn get_transactions(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        if !self.storage.account_exists(user_id)? {
            return Err(Error::NotFound(format!("account {}", user_id)));
        }

        let cap = limit
            .unwrap_or(self.config.ledger.history_limit)
            .min(self.config.ledger.history_limit);

        let mut transactions = self.storage.get_transactions(user_id)?;
        transactions.truncate(cap);
        Ok(transactions)
    }

    /// Apply a signed amount to the balance and record it
    pub async fn credit_or_debit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<LedgerReceipt> {
        let started = Instant::now();
        let result = self
            .mutate(user_id, |unit, rules| {
                let transaction =
                    unit.apply(amount, transaction_type, description, None, rules.history_limit)?;
                Ok(LedgerReceipt {
                    new_balance: unit.account.balance,
                    transaction,
                })
            })
            .await;
        self.observe("credit_or_debit", started, result)
    }

    /// Send tokens to the account named by `recipient_ref`
    ///
    /// Checks run in order: amount, sender balance, recipient. A resolvable
    /// recipient is credited in the same commit; an unresolvable one is only
    /// accepted when external recipients are allowed.
    pub async fn transfer(
        &self,
        sender_id: &UserId,
        recipient_ref: &str,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<TransferReceipt> {
        let started = Instant::now();
        let result = self.transfer_inner(sender_id, recipient_ref, amount, note).await;
        self.observe("transfer", started, result)
    }

    async fn transfer_inner(
        &self,
        sender_id: &UserId,
        recipient_ref: &str,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<TransferReceipt> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                amount
            )));
        }

        let recipient_ref = recipient_ref.trim();
        if recipient_ref.is_empty() {
            return Err(Error::InvalidRequest("recipient must not be blank".to_string()));
        }

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        let sent_description = match note {
            Some(note) => format!("Sent to {} - {}", recipient_ref, note),
            None => format!("Sent to {}", recipient_ref),
        };

        let recipient_id = self.resolver.resolve(recipient_ref)?;
        if recipient_id.as_ref() == Some(sender_id) {
            return Err(Error::InvalidRequest("cannot transfer to yourself".to_string()));
        }

        let Some(recipient_id) = recipient_id else {
            let allow_external = self.config.ledger.allow_external_recipients;
            let receipt = self
                .mutate(sender_id, |unit, rules| {
                    let transaction = unit.apply(
                        -amount,
                        TransactionType::Sent,
                        sent_description,
                        None,
                        rules.history_limit,
                    )?;
                    if !allow_external {
                        return Err(Error::NotFound(format!("recipient {}", recipient_ref)));
                    }
                    Ok(TransferReceipt {
                        new_balance: unit.account.balance,
                        transaction,
                        recipient_id: None,
                    })
                })
                .await?;

            tracing::info!(
                sender = %sender_id,
                recipient_ref = %recipient_ref,
                amount = %amount,
                "External transfer committed"
            );
            return Ok(receipt);
        };

        let _scope = self.locks.lock_pair(sender_id, &recipient_id).await;
        let mut sender = self.storage.load_unit(sender_id)?;
        let mut recipient = self.storage.load_unit(&recipient_id)?;
        let limit = self.config.ledger.history_limit;

        let transaction = sender.apply(
            -amount,
            TransactionType::Sent,
            sent_description,
            None,
            limit,
        )?;

        let received_description = match note {
            Some(note) => format!("Received from {} - {}", sender.account.username, note),
            None => format!("Received from {}", sender.account.username),
        };
        recipient.apply(amount, TransactionType::Received, received_description, None, limit)?;

        let mut changeset = Changeset::new();
        changeset.put_unit(&sender)?;
        changeset.put_unit(&recipient)?;
        self.storage.commit(changeset)?;

        self.metrics.record_transaction(TransactionType::Sent.as_str());
        self.metrics.record_transaction(TransactionType::Received.as_str());

        tracing::info!(
            sender = %sender_id,
            recipient = %recipient_id,
            amount = %amount,
            "Transfer committed"
        );

        Ok(TransferReceipt {
            new_balance: sender.account.balance,
            transaction,
            recipient_id: Some(recipient_id),
        })
    }

    /// Take an entry fee for the game in `context`
    pub async fn record_entry_fee(
        &self,
        user_id: &UserId,
        context: GameContext,
        entry_fee: Decimal,
    ) -> Result<LedgerReceipt> {
        let started = Instant::now();
        let result = self.record_entry_fee_inner(user_id, context, entry_fee).await;
        self.observe("escrow", started, result)
    }

    async fn record_entry_fee_inner(
        &self,
        user_id: &UserId,
        context: GameContext,
        entry_fee: Decimal,
    ) -> Result<LedgerReceipt> {
        if entry_fee <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "entry fee must be positive, got {}",
                entry_fee
            )));
        }

        let description = format!("Joined {}", context.game_label);
        self.mutate(user_id, |unit, rules| {
            let transaction = unit.apply(
                -entry_fee,
                TransactionType::GameEntry,
                description,
                Some(context),
                rules.history_limit,
            )?;
            Ok(LedgerReceipt {
                new_balance: unit.account.balance,
                transaction,
            })
        })
        .await
    }

    /// Settle a finished game: apply the signed amount, bump the play
    /// counters and advance the gaming statistics in one commit
    ///
    /// The amount's sign is not checked here; callers decide whether a
    /// mismatch between `result` and the sign is acceptable.
    pub async fn record_game(
        &self,
        user_id: &UserId,
        context: GameContext,
        result: GameResult,
        amount: Decimal,
    ) -> Result<GameReceipt> {
        let started = Instant::now();
        let outcome = self
            .mutate(user_id, |unit, rules| {
                let transaction =
                    unit.settle_game(context, result, amount, rules.history_limit)?;
                Ok(GameReceipt {
                    new_balance: unit.account.balance,
                    transaction,
                    statistics: unit.statistics.clone(),
                })
            })
            .await;

        if outcome.is_ok() {
            self.metrics.record_settlement(result.as_str());
        }
        self.observe("settle", started, outcome)
    }

    /// Run `operation` against a user's unit inside the user's scope
    ///
    /// The unit is committed only if `operation` returns `Ok`; on error the
    /// store is left exactly as it was.
    pub(crate) async fn mutate<T, F>(&self, user_id: &UserId, operation: F) -> Result<T>
    where
        F: FnOnce(&mut AccountUnit, &LedgerConfig) -> Result<T>,
    {
        let _scope = self.locks.lock(user_id).await;

        let mut unit = self.storage.load_unit(user_id)?;
        let recorded_before = unit.account.transaction_count;

        let output = operation(&mut unit, &self.config.ledger)?;

        let mut changeset = Changeset::new();
        changeset.put_unit(&unit)?;
        self.storage.commit(changeset)?;

        let recorded = (unit.account.transaction_count - recorded_before) as usize;
        for transaction in unit.transactions.iter().take(recorded) {
            self.metrics
                .record_transaction(transaction.transaction_type.as_str());
            tracing::debug!(
                user_id = %user_id,
                transaction_id = %transaction.id,
                kind = %transaction.transaction_type,
                amount = %transaction.amount,
                balance_after = %transaction.balance_after,
                "Transaction committed"
            );
        }

        Ok(output)
    }

    /// Record duration and rejections for a finished operation
    fn observe<T>(&self, operation: &'static str, started: Instant, result: Result<T>) -> Result<T> {
        self.metrics
            .record_duration(operation, started.elapsed().as_secs_f64());

        if let Err(ref e) = result {
            self.metrics.record_rejection(e.kind());
            if e.is_rejection() {
                tracing::warn!(operation, kind = e.kind(), error = %e, "Operation rejected");
            } else {
                tracing::error!(operation, error = %e, "Operation failed");
            }
        }

        result
    }
}
