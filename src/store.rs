//! In-memory contact store.
//!
//! The store holds the normalized contact state for one user: entities in
//! an id-keyed map, a separate insertion-order list for stable iteration,
//! and the primary-contact pointer. Every mutation is synchronous, free of
//! I/O, and preserves the store invariant:
//!
//! INVARIANT: at most one contact has `is_primary == true`, and
//! `primary_contact_id` is either `None` or that contact's id. Both sides
//! only ever move together, through `promote` / `clear_primary`.
//!
//! Durable persistence is the sync layer's job; nothing here touches disk.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Category, Contact, ContactUpdate};

/// Normalized in-memory contact state with invariant-preserving mutations.
#[derive(Debug, Default)]
pub struct ContactStore {
    /// Entities keyed by id.
    contacts: HashMap<String, Contact>,

    /// Insertion order of ids. Used for stable iteration only; carries no
    /// invariant weight.
    order: Vec<String>,

    /// Id of the current primary contact, if any.
    primary_contact_id: Option<String>,

    is_loading: bool,
    error: Option<String>,
    is_initialized: bool,
}

impl ContactStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ==================
    // Mutations
    // ==================

    /// Insert a contact.
    ///
    /// The contact becomes primary if it asks to be, or if it is the
    /// first contact ever inserted — an empty list always ends up with a
    /// primary. Re-inserting an existing id replaces the entry in place
    /// without duplicating its order slot.
    pub fn add_contact(&mut self, contact: Contact) {
        let first = self.order.is_empty();
        let make_primary = contact.is_primary || first;
        let id = contact.id.clone();

        if self.contacts.insert(id.clone(), contact).is_none() {
            self.order.push(id.clone());
        }

        if make_primary {
            self.promote(&id);
        } else {
            // A replaced entry may have been the primary; dropping the
            // flag on re-insert clears the slot rather than leaving a
            // dangling pointer.
            if self.primary_contact_id.as_deref() == Some(id.as_str()) {
                self.clear_primary();
            }
            if let Some(c) = self.contacts.get_mut(&id) {
                c.is_primary = false;
            }
        }

        debug!(id = %id, primary = make_primary, "contact added");
    }

    /// Merge a partial update into an existing contact, refreshing
    /// `updated_at`. Returns `false` (and changes nothing) for an
    /// unknown id.
    ///
    /// `is_primary: Some(true)` promotes this contact and demotes all
    /// others. `Some(false)` on the current primary leaves the slot
    /// empty — no other contact is auto-promoted.
    pub fn update_contact(&mut self, id: &str, update: &ContactUpdate) -> bool {
        let Some(contact) = self.contacts.get_mut(id) else {
            return false;
        };

        if let Some(name) = &update.name {
            contact.name = name.clone();
        }
        if let Some(phone) = &update.phone {
            contact.phone = phone.clone();
        }
        if let Some(relationship) = update.relationship {
            contact.relationship = relationship;
        }
        if let Some(category) = update.category {
            contact.category = category;
        }
        if let Some(notes) = &update.notes {
            contact.notes = notes.clone();
        }
        contact.updated_at = chrono::Utc::now().timestamp_millis();

        match update.is_primary {
            Some(true) => self.promote(id),
            Some(false) if self.primary_contact_id.as_deref() == Some(id) => {
                self.clear_primary();
            }
            // Already non-primary; the flag is false by the invariant.
            Some(false) | None => {}
        }

        true
    }

    /// Remove a contact. Returns whether anything was removed.
    ///
    /// Deleting the primary leaves `primary_contact_id` empty until a
    /// caller explicitly picks a new one.
    pub fn delete_contact(&mut self, id: &str) -> bool {
        if self.contacts.remove(id).is_none() {
            return false;
        }
        self.order.retain(|entry| entry != id);
        if self.primary_contact_id.as_deref() == Some(id) {
            self.primary_contact_id = None;
        }
        debug!(id = %id, "contact deleted");
        true
    }

    /// Replace the entire contact list.
    ///
    /// Rebuilds the map, order, and primary pointer from the input and
    /// marks the store initialized. When several input contacts are
    /// flagged primary, the first one (in input order) is authoritative
    /// and the later flags are dropped.
    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts.clear();
        self.order.clear();
        self.primary_contact_id = None;

        let mut primary_id: Option<String> = None;
        for mut contact in contacts {
            if contact.is_primary && primary_id.is_none() {
                primary_id = Some(contact.id.clone());
            }
            contact.is_primary = false;

            let id = contact.id.clone();
            if self.contacts.insert(id.clone(), contact).is_none() {
                self.order.push(id);
            }
        }

        if let Some(id) = primary_id {
            self.promote(&id);
        }
        self.is_initialized = true;

        debug!(count = self.order.len(), "contact list replaced");
    }

    /// Explicitly promote a contact to primary, demoting the previous
    /// one. Returns `false` for an unknown id.
    pub fn set_primary_contact(&mut self, id: &str) -> bool {
        if !self.contacts.contains_key(id) {
            return false;
        }
        self.promote(id);
        true
    }

    /// Reset to the empty initial state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Point the primary slot at `id` and sweep every flag to match.
    ///
    /// The flag and the pointer never move independently; this and
    /// `clear_primary` are the only places either changes.
    fn promote(&mut self, id: &str) {
        for contact in self.contacts.values_mut() {
            contact.is_primary = contact.id == id;
        }
        self.primary_contact_id = Some(id.to_string());
    }

    /// Empty the primary slot and drop every flag.
    fn clear_primary(&mut self) {
        for contact in self.contacts.values_mut() {
            contact.is_primary = false;
        }
        self.primary_contact_id = None;
    }

    // ==================
    // Queries
    // ==================

    /// All contacts in insertion order.
    #[must_use]
    pub fn contacts(&self) -> Vec<&Contact> {
        self.order
            .iter()
            .filter_map(|id| self.contacts.get(id))
            .collect()
    }

    /// Look up a contact by id.
    #[must_use]
    pub fn contact(&self, id: &str) -> Option<&Contact> {
        self.contacts.get(id)
    }

    /// Contacts in the given category, in insertion order.
    #[must_use]
    pub fn contacts_by_category(&self, category: Category) -> Vec<&Contact> {
        self.contacts()
            .into_iter()
            .filter(|contact| contact.category == category)
            .collect()
    }

    /// The current primary contact, if one is set.
    #[must_use]
    pub fn primary_contact(&self) -> Option<&Contact> {
        self.primary_contact_id
            .as_deref()
            .and_then(|id| self.contacts.get(id))
    }

    /// Id of the current primary contact.
    #[must_use]
    pub fn primary_contact_id(&self) -> Option<&str> {
        self.primary_contact_id.as_deref()
    }

    /// Whether a primary contact is set.
    #[must_use]
    pub fn has_primary(&self) -> bool {
        self.primary_contact_id.is_some()
    }

    /// Number of contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store holds no contacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The last recorded failure, for display by the caller.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether an initial load has completed (successfully or not).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    // ==================
    // Flags (sync layer)
    // ==================

    /// Set the loading flag. Used by the sync layer around storage I/O.
    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Record or clear the error surfaced to callers.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewContact, Relationship};

    fn contact(name: &str, primary: bool) -> Contact {
        NewContact::new(name, "+1-555-0100")
            .with_primary(primary)
            .into_contact("user_1")
    }

    /// The store invariant: at most one flagged primary, and the pointer
    /// matches it exactly.
    fn assert_invariant(store: &ContactStore) {
        let flagged: Vec<&Contact> = store
            .contacts()
            .into_iter()
            .filter(|c| c.is_primary)
            .collect();
        assert!(flagged.len() <= 1, "more than one contact flagged primary");
        match store.primary_contact_id() {
            Some(id) => {
                assert_eq!(flagged.len(), 1);
                assert_eq!(flagged[0].id, id);
            }
            None => assert!(flagged.is_empty()),
        }
    }

    #[test]
    fn test_first_contact_becomes_primary() {
        // Scenario: very first insert is not flagged primary, but an
        // empty list must end up with one.
        let mut store = ContactStore::new();
        let c1 = contact("Ana", false);
        let id = c1.id.clone();

        store.add_contact(c1);

        assert!(store.contact(&id).unwrap().is_primary);
        assert_eq!(store.primary_contact_id(), Some(id.as_str()));
        assert_invariant(&store);
    }

    #[test]
    fn test_new_primary_demotes_previous() {
        let mut store = ContactStore::new();
        let c1 = contact("Ana", true);
        let c2 = contact("Ben", true);
        let (id1, id2) = (c1.id.clone(), c2.id.clone());

        store.add_contact(c1);
        store.add_contact(c2);

        assert!(!store.contact(&id1).unwrap().is_primary);
        assert!(store.contact(&id2).unwrap().is_primary);
        assert_eq!(store.primary_contact_id(), Some(id2.as_str()));
        assert_invariant(&store);
    }

    #[test]
    fn test_delete_primary_leaves_slot_empty() {
        let mut store = ContactStore::new();
        let c1 = contact("Ana", true);
        let c2 = contact("Ben", true);
        let (id1, id2) = (c1.id.clone(), c2.id.clone());
        store.add_contact(c1);
        store.add_contact(c2);

        assert!(store.delete_contact(&id2));

        assert_eq!(store.primary_contact_id(), None);
        assert!(!store.contact(&id1).unwrap().is_primary);
        assert_eq!(store.len(), 1);
        assert_invariant(&store);
    }

    #[test]
    fn test_demote_primary_leaves_slot_empty() {
        let mut store = ContactStore::new();
        let c1 = contact("Ana", true);
        let id1 = c1.id.clone();
        store.add_contact(c1);
        store.add_contact(contact("Ben", false));

        let demote = ContactUpdate::new().with_primary(false);
        assert!(store.update_contact(&id1, &demote));

        assert_eq!(store.primary_contact_id(), None);
        assert!(!store.has_primary());
        assert_invariant(&store);
    }

    #[test]
    fn test_update_promotes_and_refreshes_timestamp() {
        let mut store = ContactStore::new();
        let c1 = contact("Ana", true);
        let c2 = contact("Ben", false);
        let (id1, id2) = (c1.id.clone(), c2.id.clone());
        store.add_contact(c1);
        store.add_contact(c2);
        let before = store.contact(&id2).unwrap().updated_at;

        let update = ContactUpdate::new()
            .with_phone("+1-555-0199")
            .with_primary(true);
        assert!(store.update_contact(&id2, &update));

        let updated = store.contact(&id2).unwrap();
        assert_eq!(updated.phone, "+1-555-0199");
        assert!(updated.is_primary);
        assert!(updated.updated_at >= before);
        assert!(!store.contact(&id1).unwrap().is_primary);
        assert_invariant(&store);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = ContactStore::new();
        store.add_contact(contact("Ana", false));

        let update = ContactUpdate::new().with_name("Ghost");
        assert!(!store.update_contact("ct_missing", &update));
        assert_eq!(store.len(), 1);
        assert_invariant(&store);
    }

    #[test]
    fn test_update_clears_notes() {
        let mut store = ContactStore::new();
        let c1 = NewContact::new("Ana", "+1-555-0100")
            .with_notes("allergic to penicillin")
            .into_contact("user_1");
        let id = c1.id.clone();
        store.add_contact(c1);

        store.update_contact(&id, &ContactUpdate::new().with_notes(None));
        assert_eq!(store.contact(&id).unwrap().notes, None);
    }

    #[test]
    fn test_set_contacts_first_primary_wins() {
        // Bulk replace with several flagged entries: the first flag in
        // input order is authoritative, deterministically.
        let mut store = ContactStore::new();
        let c1 = contact("Ana", false);
        let c2 = contact("Ben", true);
        let c3 = contact("Cleo", true);
        let (id2, id3) = (c2.id.clone(), c3.id.clone());

        store.set_contacts(vec![c1, c2, c3]);

        assert_eq!(store.primary_contact_id(), Some(id2.as_str()));
        assert!(!store.contact(&id3).unwrap().is_primary);
        assert!(store.is_initialized());
        assert_invariant(&store);
    }

    #[test]
    fn test_set_contacts_idempotent() {
        let mut store = ContactStore::new();
        let list = vec![contact("Ana", false), contact("Ben", true)];

        store.set_contacts(list.clone());
        let first_ids: Vec<String> =
            store.contacts().iter().map(|c| c.id.clone()).collect();
        let first_primary = store.primary_contact_id().map(ToString::to_string);

        store.set_contacts(list);

        let second_ids: Vec<String> =
            store.contacts().iter().map(|c| c.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(
            store.primary_contact_id().map(ToString::to_string),
            first_primary
        );
        assert_invariant(&store);
    }

    #[test]
    fn test_set_primary_contact_switches() {
        let mut store = ContactStore::new();
        let c1 = contact("Ana", true);
        let c2 = contact("Ben", false);
        let (id1, id2) = (c1.id.clone(), c2.id.clone());
        store.add_contact(c1);
        store.add_contact(c2);

        assert!(store.set_primary_contact(&id2));
        assert!(!store.set_primary_contact("ct_missing"));

        assert_eq!(store.primary_contact_id(), Some(id2.as_str()));
        assert!(!store.contact(&id1).unwrap().is_primary);
        assert_invariant(&store);
    }

    #[test]
    fn test_reinsert_replaces_without_duplicating_order() {
        let mut store = ContactStore::new();
        let mut c1 = contact("Ana", false);
        let id = c1.id.clone();
        store.add_contact(c1.clone());
        store.add_contact(contact("Ben", false));

        c1.name = "Ana Maria".to_string();
        store.add_contact(c1);

        assert_eq!(store.len(), 2);
        assert_eq!(store.contact(&id).unwrap().name, "Ana Maria");
        assert_invariant(&store);
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut store = ContactStore::new();
        let names = ["Ana", "Ben", "Cleo", "Dev"];
        for name in names {
            store.add_contact(contact(name, false));
        }

        let listed: Vec<&str> =
            store.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_contacts_by_category() {
        let mut store = ContactStore::new();
        store.add_contact(
            NewContact::new("Dr. Okafor", "+1-555-0110")
                .with_relationship(Relationship::Doctor)
                .with_category(Category::Medical)
                .into_contact("user_1"),
        );
        store.add_contact(
            NewContact::new("Ana", "+1-555-0100")
                .with_category(Category::Family)
                .into_contact("user_1"),
        );

        let medical = store.contacts_by_category(Category::Medical);
        assert_eq!(medical.len(), 1);
        assert_eq!(medical[0].name, "Dr. Okafor");
        assert!(store.contacts_by_category(Category::Work).is_empty());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = ContactStore::new();
        store.add_contact(contact("Ana", true));
        store.set_error(Some("save failed".to_string()));
        store.set_loading(true);

        store.clear();

        assert!(store.is_empty());
        assert!(!store.has_primary());
        assert!(!store.is_initialized());
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
    }
}
