//! Versioned record migrations.
//!
//! Persisted records carry the schema version they were written at. This
//! module holds the ordered migration registry and the runner that
//! upgrades a raw record value to [`CURRENT_VERSION`] before it is
//! deserialized.
//!
//! Each migration is a pure transform on the record JSON; the runner
//! applies the pending ones in ascending version order and collects one
//! history entry per applied step. Nothing here touches storage — the
//! sync layer persists the migrated record and the history only after the
//! whole run succeeds, so a failed run leaves the on-disk state exactly
//! as it was.

use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::MigrationHistoryEntry;

/// The schema version new records are written at.
pub const CURRENT_VERSION: u32 = 3;

/// A single migration with target version and pure transform.
struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(Value) -> std::result::Result<Value, String>,
}

/// All migrations in ascending version order.
///
/// Version 1 is the original shape and has no entry; a record at version
/// `n` is produced by applying every migration with version `> n`.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        description: "add contact categories",
        apply: add_contact_categories,
    },
    Migration {
        version: 3,
        description: "enforce single primary contact",
        apply: enforce_single_primary,
    },
];

/// Whether a stored record needs migrating to reach `target`.
#[must_use]
pub const fn is_migration_needed(current: u32, target: u32) -> bool {
    current < target
}

/// The result of a successful migration run.
#[derive(Debug)]
pub struct MigrationOutcome {
    /// The fully migrated record, stamped with the target version.
    pub record: Value,

    /// One entry per applied step, in application order. Empty when no
    /// step was pending.
    pub history: Vec<MigrationHistoryEntry>,
}

/// Upgrade `data` from `from_version` to `to_version`.
///
/// Applies every registered migration with
/// `from_version < version <= to_version`, ascending. `to_version <=
/// from_version` applies nothing and returns the data unchanged (apart
/// from the version stamp, which is only written when a step ran).
///
/// # Errors
///
/// Returns [`Error::Migration`] carrying the failing step's version if a
/// transform rejects the data. No later step is applied.
pub fn run_migrations(
    data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<MigrationOutcome> {
    let mut record = data;
    let mut history = Vec::new();

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > from_version && m.version <= to_version)
    {
        record = (migration.apply)(record).map_err(|reason| Error::Migration {
            version: migration.version,
            reason,
        })?;

        history.push(MigrationHistoryEntry::new(
            migration.version,
            migration.description,
        ));
        info!(
            version = migration.version,
            description = migration.description,
            "migration applied"
        );
    }

    if !history.is_empty() {
        if let Some(obj) = record.as_object_mut() {
            obj.insert("version".to_string(), Value::from(to_version));
        }
    }

    Ok(MigrationOutcome { record, history })
}

/// Borrow the contacts array of a raw record, or explain why not.
fn contacts_array(record: &mut Value) -> std::result::Result<&mut Vec<Value>, String> {
    record
        .get_mut("contacts")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| "contacts field is not an array".to_string())
}

/// v2: derive the `category` field for contacts that predate it.
///
/// Version-1 records grouped nothing; the category is inferred from the
/// relationship (spouse/parent/child/sibling → family, doctor → medical,
/// anything else → other). Contacts that already carry a category keep it.
fn add_contact_categories(mut record: Value) -> std::result::Result<Value, String> {
    for contact in contacts_array(&mut record)? {
        let has_category = contact
            .get("category")
            .is_some_and(|v| !v.is_null());
        if has_category {
            continue;
        }

        let category = match contact.get("relationship").and_then(Value::as_str) {
            Some("spouse" | "parent" | "child" | "sibling") => "family",
            Some("doctor") => "medical",
            _ => "other",
        };
        contact
            .as_object_mut()
            .ok_or_else(|| "contact entry is not an object".to_string())?
            .insert("category".to_string(), Value::from(category));
    }
    Ok(record)
}

/// v3: repair records in which several contacts were flagged primary.
///
/// Early app builds could persist more than one `isPrimary` flag. The
/// first flagged contact keeps it; later flags are cleared.
fn enforce_single_primary(mut record: Value) -> std::result::Result<Value, String> {
    let mut seen_primary = false;
    for contact in contacts_array(&mut record)? {
        let flagged = contact
            .get("isPrimary")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if flagged && seen_primary {
            contact
                .as_object_mut()
                .ok_or_else(|| "contact entry is not an object".to_string())?
                .insert("isPrimary".to_string(), Value::from(false));
        }
        seen_primary = seen_primary || flagged;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v1_record() -> Value {
        json!({
            "version": 1,
            "contacts": [
                {
                    "id": "ct_1", "userId": "user_1", "name": "Ana",
                    "phone": "+1-555-0100", "relationship": "spouse",
                    "isPrimary": true, "createdAt": 1_700_000_000_000_i64,
                    "updatedAt": 1_700_000_000_000_i64
                },
                {
                    "id": "ct_2", "userId": "user_1", "name": "Dr. Okafor",
                    "phone": "+1-555-0110", "relationship": "doctor",
                    "isPrimary": true, "createdAt": 1_700_000_000_000_i64,
                    "updatedAt": 1_700_000_000_000_i64
                }
            ]
        })
    }

    #[test]
    fn test_full_upgrade_applies_in_order() {
        let outcome = run_migrations(v1_record(), 1, CURRENT_VERSION).unwrap();

        let versions: Vec<u32> = outcome.history.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![2, 3]);
        assert_eq!(outcome.record["version"], json!(CURRENT_VERSION));

        // v2 derived categories from relationships
        assert_eq!(outcome.record["contacts"][0]["category"], json!("family"));
        assert_eq!(outcome.record["contacts"][1]["category"], json!("medical"));

        // v3 kept only the first primary flag
        assert_eq!(outcome.record["contacts"][0]["isPrimary"], json!(true));
        assert_eq!(outcome.record["contacts"][1]["isPrimary"], json!(false));
    }

    #[test]
    fn test_same_version_is_noop() {
        let record = v1_record();
        let outcome = run_migrations(record.clone(), 1, 1).unwrap();

        assert!(outcome.history.is_empty());
        assert_eq!(outcome.record, record);
    }

    #[test]
    fn test_downgrade_applies_nothing() {
        let record = v1_record();
        let outcome = run_migrations(record.clone(), 3, 1).unwrap();

        assert!(outcome.history.is_empty());
        assert_eq!(outcome.record, record);
    }

    #[test]
    fn test_partial_upgrade_skips_earlier_steps() {
        // A version-2 record only needs the v3 repair.
        let mut record = v1_record();
        record["version"] = json!(2);
        let outcome = run_migrations(record, 2, CURRENT_VERSION).unwrap();

        let versions: Vec<u32> = outcome.history.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![3]);
    }

    #[test]
    fn test_existing_category_is_kept() {
        let mut record = v1_record();
        record["contacts"][0]["category"] = json!("work");

        let outcome = run_migrations(record, 1, 2).unwrap();
        assert_eq!(outcome.record["contacts"][0]["category"], json!("work"));
    }

    #[test]
    fn test_malformed_record_fails_with_version() {
        let record = json!({"version": 1, "contacts": "not-an-array"});

        let err = run_migrations(record, 1, CURRENT_VERSION).unwrap_err();
        match err {
            Error::Migration { version, .. } => assert_eq!(version, 2),
            other => panic!("expected migration error, got {other}"),
        }
    }

    #[test]
    fn test_registry_versions_ascend() {
        let mut last = 1;
        for migration in MIGRATIONS {
            assert!(migration.version > last);
            last = migration.version;
        }
        assert_eq!(last, CURRENT_VERSION);
    }

    #[test]
    fn test_migrated_record_deserializes() {
        use crate::model::ContactsRecord;

        let outcome = run_migrations(v1_record(), 1, CURRENT_VERSION).unwrap();
        let record: ContactsRecord = serde_json::from_value(outcome.record).unwrap();

        assert_eq!(record.version, CURRENT_VERSION);
        assert_eq!(record.contacts.len(), 2);
        assert!(record.contacts[0].is_primary);
    }
}
