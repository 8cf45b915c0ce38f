//! Error types for the Lifeline contact store.
//!
//! Provides structured error handling with:
//! - A crate-wide [`Result`] alias
//! - Distinct read/write/migration failure classes
//! - Retryability flags driving the save retry wrapper
//!
//! Read failures are deliberately soft: the storage gateway converts them
//! to "no prior data" and logs a warning, so they rarely cross this
//! surface. Write and migration failures do, and callers are expected to
//! surface them through the store's `error` field rather than panic.

use thiserror::Error;

/// Result type alias for Lifeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Lifeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The persisted blob for a key was missing or could not be decoded.
    ///
    /// Non-fatal by policy: the gateway treats this as "no prior data".
    /// The variant exists so internal code and tests can name the failure.
    #[error("storage read failed for {key}: {reason}")]
    StorageRead { key: String, reason: String },

    /// Writing the full contact list to durable storage failed.
    ///
    /// The in-memory store is not rolled back; the mutation that
    /// triggered the save stays applied.
    #[error("storage write failed for {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    /// A migration step failed. Carries the target version of the step
    /// that failed; no later step was applied and the on-disk record is
    /// untouched.
    #[error("migration to version {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// An operation referenced a contact id that is not in the store.
    #[error("contact not found: {id}")]
    ContactNotFound { id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry of the failed operation could succeed.
    ///
    /// True for write contention classes (a concurrent process holding
    /// the database lock). False for decode failures, missing contacts,
    /// and migration errors, where retrying reproduces the same result.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageWrite { .. } | Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_errors_are_retryable() {
        let err = Error::StorageWrite {
            key: "emergency_contacts:user_1".to_string(),
            reason: "database is locked".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_migration_errors_are_not_retryable() {
        let err = Error::Migration {
            version: 2,
            reason: "contacts field is not an array".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_not_found_carries_id() {
        let err = Error::ContactNotFound {
            id: "ct_missing".to_string(),
        };
        assert_eq!(err.to_string(), "contact not found: ct_missing");
    }
}
