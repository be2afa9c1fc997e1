//! Request/response boundary
//!
//! A closed set of typed operations. Requests are internally tagged JSON
//! objects (`{"op": "transfer", "recipient": "bob", "amount": "25"}`); unknown
//! operations and unknown fields are rejected before anything runs. Amounts
//! travel as decimal strings.
//!
//! Every response is either the operation's result or
//! `{"error": {"kind": ..., "message": ...}}`.

use crate::{
    config::Config,
    engine::SettlementEngine,
    identity::{IdentityProvider, StaticTokenIdentity},
    leaderboard::{LeaderboardSource, StaticLeaderboard},
    types::{EscrowReceipt, GameResult, LeaderboardEntry, SettlementReceipt},
    Error, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wallet_ledger::{
    Account, GamingStatistics, Ledger, LedgerReceipt, Metrics, Transaction, TransactionType,
    TransferReceipt, UserId,
};

/// Wallet operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    rename_all = "snake_case",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum WalletRequest {
    /// Create the caller's account
    OpenAccount {
        /// Unique display name
        username: String,
        /// Contact email
        #[serde(default)]
        email: Option<String>,
    },

    /// Read the caller's account
    GetAccount,

    /// Apply a signed amount to the caller's balance
    CreditOrDebit {
        /// Signed delta
        amount: Decimal,
        /// Recorded transaction type
        #[serde(rename = "type")]
        transaction_type: TransactionType,
        /// Free-text label
        description: String,
    },

    /// Send tokens to another user
    Transfer {
        /// User id, username or external reference
        recipient: String,
        /// Strictly positive amount
        amount: Decimal,
        /// Optional note appended to the descriptions
        #[serde(default)]
        note: Option<String>,
    },

    /// Pay a game entry fee
    Escrow {
        /// Caller-chosen session key
        game_id: String,
        /// Display name of the game
        game_label: String,
        /// Strictly positive fee
        entry_fee: Decimal,
    },

    /// Report a finished game
    Settle {
        /// Session key used at escrow
        game_id: String,
        /// Display name of the game
        game_label: String,
        /// Win or loss
        result: GameResult,
        /// Signed net change
        amount: Decimal,
        /// Opponent reference
        opponent: String,
        /// Duration label
        duration: String,
    },

    /// Read the caller's history, newest first
    GetTransactions {
        /// Maximum entries
        #[serde(default)]
        limit: Option<usize>,
    },

    /// Read the caller's gaming statistics
    GetStatistics,

    /// Read the precomputed leaderboard
    GetLeaderboard,
}

impl WalletRequest {
    /// Operation name, as on the wire
    pub fn op(&self) -> &'static str {
        match self {
            WalletRequest::OpenAccount { .. } => "open_account",
            WalletRequest::GetAccount => "get_account",
            WalletRequest::CreditOrDebit { .. } => "credit_or_debit",
            WalletRequest::Transfer { .. } => "transfer",
            WalletRequest::Escrow { .. } => "escrow",
            WalletRequest::Settle { .. } => "settle",
            WalletRequest::GetTransactions { .. } => "get_transactions",
            WalletRequest::GetStatistics => "get_statistics",
            WalletRequest::GetLeaderboard => "get_leaderboard",
        }
    }
}

/// One request line: bearer credential plus operation
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletEnvelope {
    /// Bearer credential for the identity provider
    pub token: String,

    /// Operation to run
    pub request: WalletRequest,
}

/// Error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable kind
    pub kind: String,

    /// Human-readable message
    pub message: String,
}

/// Wallet operation result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WalletResponse {
    /// `open_account`, `get_account`
    Account(Account),

    /// `credit_or_debit`
    Ledger(LedgerReceipt),

    /// `transfer`
    Transfer(TransferReceipt),

    /// `escrow`
    Escrow(EscrowReceipt),

    /// `settle`
    Settlement(SettlementReceipt),

    /// `get_transactions`
    Transactions {
        /// Newest first
        transactions: Vec<Transaction>,
    },

    /// `get_statistics`
    Statistics {
        /// Current aggregates
        #[serde(rename = "gamingStats")]
        gaming_stats: GamingStatistics,
    },

    /// `get_leaderboard`
    Leaderboard {
        /// Rank order
        leaderboard: Vec<LeaderboardEntry>,
    },

    /// Any failure
    Error {
        /// Kind and message
        error: ErrorBody,
    },
}

impl WalletResponse {
    /// Error response for `error`
    pub fn from_error(error: &Error) -> Self {
        WalletResponse::Error {
            error: ErrorBody {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    /// Whether this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, WalletResponse::Error { .. })
    }
}

/// Authenticates callers and dispatches wallet operations
pub struct WalletService {
    ledger: Arc<Ledger>,
    settlement: SettlementEngine,
    identity: Arc<dyn IdentityProvider>,
    leaderboard: Arc<dyn LeaderboardSource>,
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl WalletService {
    /// Assemble a service from explicit collaborators
    pub fn new(
        ledger: Arc<Ledger>,
        settlement: SettlementEngine,
        identity: Arc<dyn IdentityProvider>,
        leaderboard: Arc<dyn LeaderboardSource>,
    ) -> Self {
        Self {
            ledger,
            settlement,
            identity,
            leaderboard,
        }
    }

    /// Open the configured store and wire the bundled collaborators
    pub fn from_config(config: &Config) -> Result<Self> {
        let ledger = Arc::new(Ledger::open(config.ledger.clone())?);
        let settlement = SettlementEngine::new(ledger.clone(), config.settlement.clone());
        let identity = Arc::new(StaticTokenIdentity::from_config(&config.identity)?);
        let leaderboard = Arc::new(StaticLeaderboard::from_config(&config.leaderboard));
        Ok(Self::new(ledger, settlement, identity, leaderboard))
    }

    /// Settlement engine
    pub fn settlement(&self) -> &SettlementEngine {
        &self.settlement
    }

    /// Ledger metrics, for export by the host process
    pub fn metrics(&self) -> &Metrics {
        self.ledger.metrics()
    }

    /// Handle one raw JSON envelope line
    pub async fn handle_line(&self, line: &str) -> WalletResponse {
        match serde_json::from_str::<WalletEnvelope>(line) {
            Ok(envelope) => self.handle(&envelope.token, envelope.request).await,
            Err(e) => {
                let error = Error::from(e);
                tracing::warn!(error = %error, "Malformed request");
                WalletResponse::from_error(&error)
            }
        }
    }

    /// Authenticate `bearer` and run `request` as that user
    pub async fn handle(&self, bearer: &str, request: WalletRequest) -> WalletResponse {
        let op = request.op();
        let outcome = match self.identity.authenticate(bearer) {
            Ok(user_id) => {
                tracing::debug!(user_id = %user_id, op, "Dispatching request");
                self.dispatch(&user_id, request).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => response,
            Err(e) => {
                if matches!(e, Error::Unauthorized(_)) {
                    tracing::warn!(op, error = %e, "Request rejected");
                }
                WalletResponse::from_error(&e)
            }
        }
    }

    /// Run `request` for an already authenticated user
    pub async fn dispatch(&self, user_id: &UserId, request: WalletRequest) -> Result<WalletResponse> {
        let response = match request {
            WalletRequest::OpenAccount { username, email } => {
                let email = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
                WalletResponse::Account(self.ledger.open_account(user_id, &username, email).await?)
            }
            WalletRequest::GetAccount => WalletResponse::Account(self.ledger.get_account(user_id)?),
            WalletRequest::CreditOrDebit {
                amount,
                transaction_type,
                description,
            } => WalletResponse::Ledger(
                self.ledger
                    .credit_or_debit(user_id, amount, transaction_type, &description)
                    .await?,
            ),
            WalletRequest::Transfer {
                recipient,
                amount,
                note,
            } => WalletResponse::Transfer(
                self.ledger
                    .transfer(user_id, &recipient, amount, note.as_deref())
                    .await?,
            ),
            WalletRequest::Escrow {
                game_id,
                game_label,
                entry_fee,
            } => WalletResponse::Escrow(
                self.settlement
                    .escrow(user_id, &game_id, &game_label, entry_fee)
                    .await?,
            ),
            WalletRequest::Settle {
                game_id,
                game_label,
                result,
                amount,
                opponent,
                duration,
            } => WalletResponse::Settlement(
                self.settlement
                    .settle(user_id, &game_id, &game_label, result, amount, &opponent, &duration)
                    .await?,
            ),
            WalletRequest::GetTransactions { limit } => WalletResponse::Transactions {
                transactions: self.ledger.get_transactions(user_id, limit)?,
            },
            WalletRequest::GetStatistics => WalletResponse::Statistics {
                gaming_stats: self.settlement.stats().get(user_id)?,
            },
            WalletRequest::GetLeaderboard => WalletResponse::Leaderboard {
                leaderboard: self.leaderboard.leaderboard()?,
            },
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let request: WalletRequest = serde_json::from_str(
            r#"{"op":"settle","gameId":"g1","gameLabel":"Arena","result":"win","amount":"120","opponent":"Bob","duration":"5:30"}"#,
        )
        .unwrap();

        assert_eq!(
            request,
            WalletRequest::Settle {
                game_id: "g1".to_string(),
                game_label: "Arena".to_string(),
                result: GameResult::Win,
                amount: Decimal::from(120),
                opponent: "Bob".to_string(),
                duration: "5:30".to_string(),
            }
        );
        assert_eq!(request.op(), "settle");
    }

    #[test]
    fn test_request_optional_fields() {
        let request: WalletRequest =
            serde_json::from_str(r#"{"op":"transfer","recipient":"bob","amount":"25"}"#).unwrap();
        assert!(matches!(request, WalletRequest::Transfer { note: None, .. }));

        let request: WalletRequest = serde_json::from_str(r#"{"op":"get_account"}"#).unwrap();
        assert_eq!(request, WalletRequest::GetAccount);
    }

    #[test]
    fn test_request_rejects_malformed() {
        let unknown_op = serde_json::from_str::<WalletRequest>(r#"{"op":"mint"}"#);
        assert!(unknown_op.is_err());

        let unknown_field = serde_json::from_str::<WalletRequest>(
            r#"{"op":"escrow","gameId":"g1","gameLabel":"Arena","entryFee":"5","bonus":"1"}"#,
        );
        assert!(unknown_field.is_err());

        let missing_field =
            serde_json::from_str::<WalletRequest>(r#"{"op":"transfer","recipient":"bob"}"#);
        assert!(missing_field.is_err());

        let bad_type = serde_json::from_str::<WalletRequest>(
            r#"{"op":"credit_or_debit","amount":"5","type":"bonus","description":"x"}"#,
        );
        assert!(bad_type.is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let response = WalletResponse::from_error(&Error::Unauthorized("unknown bearer token".into()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["kind"], "unauthorized");
        assert_eq!(json["error"]["message"], "Unauthorized: unknown bearer token");
        assert!(response.is_error());
    }
}
