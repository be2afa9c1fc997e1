//! Error types for the ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced account (or recipient) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Account already opened for this user or username
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Debit would drive the balance negative
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the operation tried to take
        required: Decimal,
        /// Balance at the time of the attempt
        available: Decimal,
    },

    /// Non-positive amount where a positive one is required
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed request rejected at the boundary
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage error (KV adapter)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::AccountExists(_) => "account_exists",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Storage(_) => "storage",
            Error::Serialization(_) => "serialization",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// Domain rejections are caller mistakes, everything else is infrastructure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::AccountExists(_)
                | Error::InsufficientBalance { .. }
                | Error::InvalidAmount(_)
                | Error::InvalidRequest(_)
        )
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
