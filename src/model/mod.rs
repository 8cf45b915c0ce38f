//! Data models for Lifeline.
//!
//! This module contains all domain types:
//! - Contact (with Relationship and Category)
//! - NewContact / ContactUpdate input payloads
//! - ContactsRecord / MigrationHistoryEntry persisted shapes

pub mod contact;
pub mod record;

pub use contact::{Category, Contact, ContactUpdate, NewContact, Relationship};
pub use record::{ContactsRecord, MigrationHistoryEntry};
