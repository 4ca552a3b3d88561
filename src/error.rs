//! Error types for Tallyguard.

use thiserror::Error;

/// Main error type for Tallyguard operations.
#[derive(Error, Debug)]
pub enum TallyguardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Counter store failures (unreachable, rejected command, ...)
    #[error("Counter store error: {0}")]
    Store(String),

    /// A stored counter value that is not an integer
    #[error("Counter for key '{key}' holds a non-integer value: {value:?}")]
    Parse { key: String, value: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tallyguard operations.
pub type Result<T> = std::result::Result<T, TallyguardError>;
