//! Store/storage coordination.
//!
//! [`ContactsService`] is the one object allowed to move contact state
//! between memory and disk. It owns the in-memory [`ContactStore`] and
//! the [`StorageGateway`], drives migrations on load, and persists every
//! mutation with the same policy:
//!
//! - Mutations apply to the store first, so callers see the change
//!   immediately, then the full current list is saved. A failed save is
//!   recorded ([`WriteStatus::Failed`] plus the store `error` field) but
//!   the in-memory change is NOT reverted: writes are at-least-once and
//!   eventually consistent, not two-phase commit.
//! - Saves retry on contention with bounded exponential backoff.
//! - Because every mutating call takes `&mut self`, saves are issued
//!   strictly in mutation order; a stale snapshot can never overwrite a
//!   newer one.
//!
//! Change detection uses SHA-256 content hashes of the serialized list,
//! comparing the live store against the last committed snapshot.

use std::time::Duration;

use backon::{BlockingRetryable, ExponentialBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::migrate::{self, CURRENT_VERSION};
use crate::model::{
    Contact, ContactUpdate, ContactsRecord, MigrationHistoryEntry, NewContact,
};
use crate::storage::StorageGateway;
use crate::store::ContactStore;

/// Outcome of the most recent durable write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStatus {
    /// No write has been attempted yet.
    #[default]
    Idle,
    /// A write is in flight.
    Pending,
    /// The last write reached durable storage.
    Committed,
    /// The last write failed; the in-memory state is ahead of disk.
    Failed,
}

impl WriteStatus {
    /// Get the string representation for display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::Failed => "failed",
        }
    }
}

/// Coordinates the in-memory store with durable storage.
#[derive(Debug)]
pub struct ContactsService {
    store: ContactStore,
    gateway: StorageGateway,
    write_status: WriteStatus,
    last_committed_hash: Option<String>,
}

impl ContactsService {
    /// Create a service around an opened gateway, with an empty store.
    #[must_use]
    pub fn new(gateway: StorageGateway) -> Self {
        Self {
            store: ContactStore::new(),
            gateway,
            write_status: WriteStatus::default(),
            last_committed_hash: None,
        }
    }

    /// Read access to the in-memory store.
    ///
    /// All writes go through this service; nothing else may mutate the
    /// store or the durable record.
    #[must_use]
    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    /// Outcome of the most recent save.
    #[must_use]
    pub fn write_status(&self) -> WriteStatus {
        self.write_status
    }

    /// Whether the in-memory list differs from the last committed
    /// snapshot. Callers use this for "unsaved changes" affordances.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        let current = content_hash(&self.store.contacts());
        self.last_committed_hash.as_deref() != Some(current.as_str())
    }

    /// The applied-migration audit trail.
    #[must_use]
    pub fn migration_history(&self) -> Vec<MigrationHistoryEntry> {
        self.gateway.read_history()
    }

    // ==================
    // Load
    // ==================

    /// Load a user's contacts from storage into the store, migrating the
    /// persisted record first when it is behind [`CURRENT_VERSION`].
    ///
    /// Missing or undecodable data loads as an empty list. A migration
    /// failure empties the store, records the error, and is returned —
    /// but in every path the store ends not-loading and initialized, so
    /// callers are never stuck on a perpetual spinner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Migration`] if a migration step fails, or
    /// [`Error::StorageWrite`] if writing the migrated record back fails.
    pub fn load_from_storage(&mut self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "loading contacts from storage");
        self.store.set_loading(true);
        self.store.set_error(None);

        let result = self.load_inner(user_id);
        if let Err(e) = &result {
            // Fatal for this load cycle only: fall back to empty but
            // leave the store initialized and usable.
            self.store.set_contacts(Vec::new());
            self.store.set_error(Some(e.to_string()));
        }
        self.store.set_loading(false);
        result
    }

    fn load_inner(&mut self, user_id: &str) -> Result<()> {
        let contacts = match self.gateway.read_raw(user_id) {
            None => Vec::new(),
            Some((version, value)) => {
                let value = if migrate::is_migration_needed(version, CURRENT_VERSION) {
                    let outcome = migrate::run_migrations(value, version, CURRENT_VERSION)?;
                    // The migrated record and its audit entries are only
                    // persisted here, after the whole run succeeded.
                    self.gateway.write_raw(user_id, &outcome.record)?;
                    self.gateway.append_history(&outcome.history)?;
                    info!(
                        from = version,
                        to = CURRENT_VERSION,
                        steps = outcome.history.len(),
                        "persisted record migrated"
                    );
                    outcome.record
                } else {
                    value
                };

                match serde_json::from_value::<ContactsRecord>(value) {
                    Ok(record) => record.contacts,
                    Err(e) => {
                        warn!(user_id = %user_id, error = %e, "record failed to decode, starting empty");
                        Vec::new()
                    }
                }
            }
        };

        self.last_committed_hash = Some(content_hash(&contacts));
        self.store.set_contacts(contacts);
        Ok(())
    }

    // ==================
    // Mutations
    // ==================

    /// Create a contact from the payload, add it to the store, and save.
    ///
    /// The id and timestamps are generated here; callers never pick
    /// either. Returns the contact as stored (its primary flag may have
    /// been set by the first-contact rule).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the save fails; the contact
    /// stays in the store.
    pub fn add_with_storage(&mut self, user_id: &str, new: NewContact) -> Result<Contact> {
        let contact = new.into_contact(user_id);
        let id = contact.id.clone();
        self.store.add_contact(contact.clone());
        self.persist(user_id)?;
        Ok(self.store.contact(&id).cloned().unwrap_or(contact))
    }

    /// Apply a partial update to a contact and save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContactNotFound`] for an unknown id (before any
    /// write), or [`Error::StorageWrite`] if the save fails; the update
    /// stays applied in memory.
    pub fn update_with_storage(
        &mut self,
        user_id: &str,
        id: &str,
        update: &ContactUpdate,
    ) -> Result<()> {
        if !self.store.update_contact(id, update) {
            return Err(Error::ContactNotFound { id: id.to_string() });
        }
        self.persist(user_id)
    }

    /// Delete a contact and save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContactNotFound`] for an unknown id, or
    /// [`Error::StorageWrite`] if the save fails; the deletion stays
    /// applied in memory.
    pub fn delete_with_storage(&mut self, user_id: &str, id: &str) -> Result<()> {
        if !self.store.delete_contact(id) {
            return Err(Error::ContactNotFound { id: id.to_string() });
        }
        self.persist(user_id)
    }

    /// Promote a contact to primary and save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContactNotFound`] for an unknown id, or
    /// [`Error::StorageWrite`] if the save fails; the promotion stays
    /// applied in memory.
    pub fn set_primary_with_storage(&mut self, user_id: &str, id: &str) -> Result<()> {
        if !self.store.set_primary_contact(id) {
            return Err(Error::ContactNotFound { id: id.to_string() });
        }
        self.persist(user_id)
    }

    /// Explicitly save the current contact list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the save fails.
    pub fn sync_to_storage(&mut self, user_id: &str) -> Result<()> {
        self.persist(user_id)
    }

    /// Save the full current list, with bounded retry on contention.
    fn persist(&mut self, user_id: &str) -> Result<()> {
        self.write_status = WriteStatus::Pending;
        let contacts: Vec<Contact> = self.store.contacts().into_iter().cloned().collect();

        let gateway = &self.gateway;
        let save = || gateway.save(&contacts, user_id);
        let result = save
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(50))
                    .with_max_times(2),
            )
            .when(Error::is_retryable)
            .notify(|err, delay| {
                warn!(error = %err, delay = ?delay, "save failed, retrying");
            })
            .call();

        match result {
            Ok(()) => {
                self.write_status = WriteStatus::Committed;
                self.last_committed_hash = Some(content_hash(&contacts));
                self.store.set_error(None);
                Ok(())
            }
            Err(e) => {
                self.write_status = WriteStatus::Failed;
                self.store.set_error(Some(e.to_string()));
                warn!(user_id = %user_id, error = %e, "save failed, in-memory changes retained");
                Err(e)
            }
        }
    }
}

/// SHA-256 fingerprint of a serializable value, via its JSON form.
///
/// # Panics
///
/// Panics if the value cannot be serialized to JSON. This should never
/// happen for our data types which are all serializable.
#[must_use]
fn content_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}
