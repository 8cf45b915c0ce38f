//! Emergency contact model.
//!
//! A [`Contact`] is one entry in a user's emergency list. New contacts are
//! built from a [`NewContact`] payload (the caller never picks ids or
//! timestamps), and partial edits travel as a [`ContactUpdate`].

use serde::{Deserialize, Serialize};

/// How a contact is related to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Spouse,
    Parent,
    Child,
    Sibling,
    Friend,
    Doctor,
    Other,
}

impl Relationship {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Sibling => "sibling",
            Self::Friend => "friend",
            Self::Doctor => "doctor",
            Self::Other => "other",
        }
    }

    /// Parse from string. Unknown values fall back to `Other`.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "spouse" => Self::Spouse,
            "parent" => Self::Parent,
            "child" => Self::Child,
            "sibling" => Self::Sibling,
            "friend" => Self::Friend,
            "doctor" => Self::Doctor,
            _ => Self::Other,
        }
    }
}

impl Default for Relationship {
    fn default() -> Self {
        Self::Other
    }
}

/// Grouping used by list screens and quick filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Family,
    Medical,
    Work,
    Other,
}

impl Category {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Medical => "medical",
            Self::Work => "work",
            Self::Other => "other",
        }
    }

    /// Parse from string. Unknown values fall back to `Other`.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "family" => Self::Family,
            "medical" => Self::Medical,
            "work" => Self::Work,
            _ => Self::Other,
        }
    }

    /// The category implied by a relationship, for records that predate
    /// the category field.
    #[must_use]
    pub const fn for_relationship(relationship: Relationship) -> Self {
        match relationship {
            Relationship::Spouse
            | Relationship::Parent
            | Relationship::Child
            | Relationship::Sibling => Self::Family,
            Relationship::Doctor => Self::Medical,
            Relationship::Friend | Relationship::Other => Self::Other,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

/// A single emergency contact.
///
/// Field names serialize in camelCase to match the persisted record
/// layout (`userId`, `isPrimary`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Unique identifier (`ct_` + 12 hex chars).
    pub id: String,

    /// Owning user.
    pub user_id: String,

    /// Display name.
    pub name: String,

    /// Phone number, stored as given. Format validation is the caller's
    /// responsibility before submission.
    pub phone: String,

    /// Relation to the user.
    #[serde(default)]
    pub relationship: Relationship,

    /// List grouping.
    #[serde(default)]
    pub category: Category,

    /// Whether this is the one-tap priority contact. At most one contact
    /// per store carries this flag.
    #[serde(default)]
    pub is_primary: bool,

    /// Free-form notes (allergies, access codes, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Creation timestamp (Unix milliseconds).
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds).
    pub updated_at: i64,
}

/// Caller-supplied payload for creating a contact.
///
/// The sync layer turns this into a [`Contact`] with a generated id and
/// fresh timestamps; callers never choose either.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub relationship: Relationship,
    pub category: Category,
    pub is_primary: bool,
    pub notes: Option<String>,
}

impl NewContact {
    /// Create a payload with default relationship and category.
    #[must_use]
    pub fn new(name: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            relationship: Relationship::Other,
            category: Category::Other,
            is_primary: false,
            notes: None,
        }
    }

    /// Set the relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = relationship;
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Request the primary slot.
    #[must_use]
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    /// Set the notes text.
    #[must_use]
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Materialize into a [`Contact`] owned by `user_id`, with a
    /// generated id and current timestamps.
    #[must_use]
    pub fn into_contact(self, user_id: &str) -> Contact {
        let now = chrono::Utc::now().timestamp_millis();
        let id = format!("ct_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);

        Contact {
            id,
            user_id: user_id.to_string(),
            name: self.name,
            phone: self.phone,
            relationship: self.relationship,
            category: self.category,
            is_primary: self.is_primary,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial edit applied to an existing contact.
///
/// `None` fields are left untouched. `notes` uses a nested option so the
/// text can be cleared (`Some(None)`) as well as replaced.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<Relationship>,
    pub category: Option<Category>,
    pub is_primary: Option<bool>,
    pub notes: Option<Option<String>>,
}

impl ContactUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Replace the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Replace the relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    /// Replace the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Promote (`true`) or demote (`false`) the contact.
    #[must_use]
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = Some(is_primary);
        self
    }

    /// Replace the notes, or clear them with `None`.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<&str>) -> Self {
        self.notes = Some(notes.map(ToString::to_string));
        self
    }

    /// Returns true if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.relationship.is_none()
            && self.category.is_none()
            && self.is_primary.is_none()
            && self.notes.is_none()
    }
}
