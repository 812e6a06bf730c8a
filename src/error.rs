//! Error type shared by the scheduler, the store and the import/export code.

/// Flashback error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FlashbackError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Recall quality outside 0-5
    #[error("Invalid quality '{0}': expected an integer from 0 to 5")]
    InvalidQuality(String),
    /// Problem key that does not look like `1873A`
    #[error("Invalid problem key '{0}': expected contest id followed by index, e.g. 1873A")]
    InvalidProblemKey(String),
    /// No entry for this user and problem
    #[error("No flashback entry for problem {key} (user {user})")]
    NotFound { user: String, key: String },
    /// Stored or imported state that violates the SM-2 invariants
    #[error("Invalid entry for problem {key}: {reason}")]
    InvalidEntry { key: String, reason: String },
    /// Next review date can't be represented
    #[error("Next review date is out of range ({0} days ahead)")]
    DateOutOfRange(u32),
}

/// Flashback result type
pub type Result<T> = std::result::Result<T, FlashbackError>;
