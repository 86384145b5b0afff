//! Error types for the trip ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Integrity violation a caller must resolve (blocked edit, double
    /// confirm, removal with outstanding balance)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Trip not found
    #[error("Trip not found: {0}")]
    TripNotFound(String),

    /// Expense not found
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    /// Split not found
    #[error("Split not found: {0}")]
    SplitNotFound(String),

    /// Settlement not found
    #[error("Settlement not found: {0}")]
    SettlementNotFound(String),

    /// Member not found
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Activity not found
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// Invariant violation (money conservation, split sums, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error is a conflict the caller can act on
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Whether this error is a missing-record lookup
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TripNotFound(_)
                | Error::ExpenseNotFound(_)
                | Error::SplitNotFound(_)
                | Error::SettlementNotFound(_)
                | Error::MemberNotFound(_)
                | Error::ActivityNotFound(_)
        )
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
