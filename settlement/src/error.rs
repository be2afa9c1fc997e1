//! Error types for the settlement engine and the wallet boundary

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error(transparent)]
    Ledger(#[from] wallet_ledger::Error),

    /// Bearer credential rejected by the identity provider
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Game result and amount sign disagree
    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    /// Malformed request rejected at the boundary
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Ledger(e) => e.kind(),
            Error::Unauthorized(_) => "unauthorized",
            Error::InvalidOutcome(_) => "invalid_outcome",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }

    /// Caller mistakes, as opposed to infrastructure failures
    pub fn is_rejection(&self) -> bool {
        match self {
            Error::Ledger(e) => e.is_rejection(),
            Error::Unauthorized(_) | Error::InvalidOutcome(_) | Error::InvalidRequest(_) => true,
            Error::Config(_) | Error::Io(_) => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidRequest(e.to_string())
    }
}
