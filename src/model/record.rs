//! Persisted record shapes.
//!
//! These are the JSON layouts written to durable storage: the per-user
//! [`ContactsRecord`] and the append-only [`MigrationHistoryEntry`] audit
//! trail. They are versioned; the migration engine upgrades older shapes
//! before they are deserialized into these types.

use serde::{Deserialize, Serialize};

use crate::model::Contact;

/// The versioned per-user record stored under `<namespace>:<userId>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsRecord {
    /// Schema version the record was written at.
    pub version: u32,

    /// The full contact list. Saves always write the entire list; there
    /// is no incremental diffing.
    pub contacts: Vec<Contact>,

    /// ISO-8601 timestamp of the last successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
}

impl ContactsRecord {
    /// Build a record at the given version with a fresh `lastSync` stamp.
    #[must_use]
    pub fn new(version: u32, contacts: Vec<Contact>) -> Self {
        Self {
            version,
            contacts,
            last_sync: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// One applied migration, recorded under `<namespace>:migration_history`.
///
/// The history is append-only: entries accumulate across upgrades and are
/// never rewritten, giving an audit trail beyond the bare version number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationHistoryEntry {
    /// Target version of the applied migration.
    pub version: u32,

    /// Human-readable description of what the migration did.
    pub description: String,

    /// ISO-8601 timestamp when the step ran.
    pub executed_at: String,
}

impl MigrationHistoryEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(version: u32, description: &str) -> Self {
        Self {
            version,
            description: description.to_string(),
            executed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
