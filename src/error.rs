//! Error types for stimulus preparation and the trial ledger.

use thiserror::Error;

/// Result type alias for `stimlag` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the builder, the epoch resolver and the ledger.
#[derive(Error, Debug)]
pub enum Error {
    /// Interval or index outside the available epoch / sample coverage.
    #[error("out of range: {0}")]
    Range(String),

    /// Caller-supplied data does not satisfy an operation's precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed ledger counter line or container header.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
