//! Error types for settlement operations

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Netting algorithm error (malformed balance input)
    #[error("Netting error: {0}")]
    Netting(String),

    /// Malformed settlement input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workflow conflict (wrong resolver, terminal-state transition)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Plan failed its own correctness check
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
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
