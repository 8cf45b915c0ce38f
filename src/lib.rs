//! Lifeline - emergency contact storage engine
//!
//! This crate holds the canonical set of a user's emergency contacts: a
//! normalized in-memory store enforcing the single-primary-contact
//! invariant, durable persistence to device storage, and a versioned
//! migration pipeline for previously-persisted data. UI layers consume
//! the read and mutation surface; rendering, dialing, and location
//! sharing live elsewhere.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Contact, input payloads, persisted records)
//! - [`store`] - In-memory normalized contact store
//! - [`storage`] - SQLite key-value persistence gateway
//! - [`migrate`] - Versioned record migrations
//! - [`sync`] - Store/storage coordination and write tracking
//! - [`config`] - Database path and namespace resolution
//! - [`error`] - Error types and handling
//!
//! # Example
//!
//! ```no_run
//! use lifeline::model::NewContact;
//! use lifeline::storage::StorageGateway;
//! use lifeline::sync::ContactsService;
//!
//! # fn main() -> lifeline::Result<()> {
//! let path = lifeline::config::resolve_db_path(None).expect("home dir");
//! let mut service = ContactsService::new(StorageGateway::open(&path)?);
//!
//! service.load_from_storage("user_1")?;
//! service.add_with_storage("user_1", NewContact::new("Ana", "+1-555-0100"))?;
//! assert!(service.store().has_primary());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod migrate;
pub mod model;
pub mod storage;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
pub use migrate::CURRENT_VERSION;
