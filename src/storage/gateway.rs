//! SQLite-backed storage gateway.
//!
//! Persists the versioned per-user contact record and the migration
//! history as JSON documents in a key-value table. Reads are soft: a
//! missing key, invalid JSON, or an unexpected shape all come back as "no
//! prior data" with a warning, never as an error. Writes replace the
//! whole record and do surface failures, since the caller needs to know
//! its in-memory state is ahead of disk.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config;
use crate::error::{Error, Result};
use crate::migrate::CURRENT_VERSION;
use crate::model::{Contact, ContactsRecord, MigrationHistoryEntry};

/// Key suffix for the migration history log.
const HISTORY_KEY: &str = "migration_history";

/// SQLite-backed key-value gateway for contact records.
#[derive(Debug)]
pub struct StorageGateway {
    conn: Connection,
    namespace: String,
}

impl StorageGateway {
    /// Open a database at the given path with the default busy timeout.
    ///
    /// Creates the database and applies schema if it doesn't exist. The
    /// key namespace comes from the environment (see [`config`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema fails to apply.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout in milliseconds.
    ///
    /// The timeout bounds how long a save can stall on a lock held by
    /// another process; the default is 5 seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema fails to apply.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5000)))?;
        super::schema::apply_schema(&conn)?;

        Ok(Self {
            conn,
            namespace: config::resolve_namespace(None),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::apply_schema(&conn)?;

        Ok(Self {
            conn,
            namespace: config::resolve_namespace(None),
        })
    }

    /// Override the key namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// The active key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage key for a user's contact record.
    #[must_use]
    pub fn record_key(&self, user_id: &str) -> String {
        format!("{}:{user_id}", self.namespace)
    }

    /// Storage key for the migration history log.
    #[must_use]
    pub fn history_key(&self) -> String {
        format!("{}:{HISTORY_KEY}", self.namespace)
    }

    // ==================
    // Contact records
    // ==================

    /// Load the contact list for a user.
    ///
    /// A missing key, undecodable JSON, or a record shape that fails to
    /// deserialize all yield an empty list: read failures mean "no prior
    /// data", not a broken app.
    #[must_use]
    pub fn load(&self, user_id: &str) -> Vec<Contact> {
        let key = self.record_key(user_id);
        let Some((_, value)) = self.read_raw(user_id) else {
            return Vec::new();
        };

        match serde_json::from_value::<ContactsRecord>(value) {
            Ok(record) => record.contacts,
            Err(e) => {
                warn!(key = %key, error = %e, "persisted record failed to decode, treating as empty");
                Vec::new()
            }
        }
    }

    /// Read the stored version and raw record value for a user, for the
    /// migration pipeline. `None` on missing or malformed data.
    #[must_use]
    pub fn read_raw(&self, user_id: &str) -> Option<(u32, Value)> {
        let key = self.record_key(user_id);
        let text = match self.get(&key) {
            Ok(text) => text?,
            Err(e) => {
                warn!(key = %key, error = %e, "storage read failed, treating as empty");
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "persisted record is not valid JSON, treating as empty");
                return None;
            }
        };

        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok());
        match version {
            Some(version) => Some((version, value)),
            None => {
                warn!(key = %key, "persisted record has no version field, treating as empty");
                None
            }
        }
    }

    /// Serialize the entire contact list and overwrite the prior record.
    ///
    /// This is a full snapshot at [`CURRENT_VERSION`] with a fresh
    /// `lastSync` stamp, not an incremental diff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the write fails. The caller's
    /// in-memory state is not rolled back.
    pub fn save(&self, contacts: &[Contact], user_id: &str) -> Result<()> {
        let key = self.record_key(user_id);
        let record = ContactsRecord::new(CURRENT_VERSION, contacts.to_vec());
        let text = serde_json::to_string(&record)
            .map_err(|e| write_error(&key, &e.to_string()))?;

        self.put(&key, &text)
            .map_err(|e| write_error(&key, &e.to_string()))?;
        debug!(key = %key, count = contacts.len(), "contact record saved");
        Ok(())
    }

    /// Write an already-migrated raw record value for a user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the write fails.
    pub fn write_raw(&self, user_id: &str, record: &Value) -> Result<()> {
        let key = self.record_key(user_id);
        let text =
            serde_json::to_string(record).map_err(|e| write_error(&key, &e.to_string()))?;
        self.put(&key, &text)
            .map_err(|e| write_error(&key, &e.to_string()))
    }

    // ==================
    // Migration history
    // ==================

    /// Append entries to the migration history log.
    ///
    /// The log is append-only: existing entries are preserved and the new
    /// ones are added at the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the write fails.
    pub fn append_history(&self, entries: &[MigrationHistoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let key = self.history_key();
        let mut history = self.read_history();
        history.extend(entries.iter().cloned());

        let text = serde_json::to_string(&history)
            .map_err(|e| write_error(&key, &e.to_string()))?;
        self.put(&key, &text)
            .map_err(|e| write_error(&key, &e.to_string()))?;
        debug!(key = %key, appended = entries.len(), "migration history appended");
        Ok(())
    }

    /// Read the migration history log. Missing or corrupt data yields an
    /// empty log, same policy as record reads.
    #[must_use]
    pub fn read_history(&self) -> Vec<MigrationHistoryEntry> {
        let key = self.history_key();
        let text = match self.get(&key) {
            Ok(Some(text)) => text,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "history read failed, treating as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "history log failed to decode, treating as empty");
            Vec::new()
        })
    }

    // ==================
    // Key-value plumbing
    // ==================

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )?;
        Ok(())
    }
}

fn write_error(key: &str, reason: &str) -> Error {
    Error::StorageWrite {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
