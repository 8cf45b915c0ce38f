//! Durable storage layer for Lifeline.
//!
//! This module provides the persistence gateway backed by SQLite:
//! - A key-value table holding JSON documents, one key per user record
//! - Busy-timeout discipline for cross-process contention
//! - Soft reads: missing or corrupt data is "no prior data", never fatal
//!
//! # Submodules
//!
//! - [`gateway`] - Main key-value gateway implementation
//! - [`schema`] - Database schema definitions

pub mod gateway;
pub mod schema;

pub use gateway::StorageGateway;
