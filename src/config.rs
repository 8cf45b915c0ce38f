//! Configuration management.
//!
//! Resolves the database path and the storage key namespace. The
//! environment surface is deliberately small: a path override, a test
//! redirect, and the namespace. Everything else is fixed by the crate.

use std::path::{Path, PathBuf};

/// Namespace used for storage keys when nothing overrides it.
pub const DEFAULT_NAMESPACE: &str = "emergency_contacts";

/// Get the global Lifeline directory location (`~/.lifeline`).
#[must_use]
pub fn global_lifeline_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".lifeline"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `LIFELINE_TEST_DB` to any value other
/// than empty, `0`, or `false`. It redirects all database operations to
/// an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("LIFELINE_TEST_DB")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Get the test database path (`~/.lifeline/test/lifeline.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_lifeline_dir().map(|dir| dir.join("test").join("lifeline.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path`, when the embedding app supplies one
/// 2. `LIFELINE_TEST_DB` → isolated test database
/// 3. `LIFELINE_DB` environment variable
/// 4. Global location: `~/.lifeline/data/lifeline.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no home directory
/// could be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("LIFELINE_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_lifeline_dir().map(|dir| dir.join("data").join("lifeline.db"))
}

/// Resolve the storage key namespace.
///
/// Priority:
/// 1. `explicit`, when the embedding app supplies one
/// 2. `LIFELINE_NAMESPACE` environment variable
/// 3. [`DEFAULT_NAMESPACE`]
#[must_use]
pub fn resolve_namespace(explicit: Option<&str>) -> String {
    if let Some(namespace) = explicit {
        if !namespace.is_empty() {
            return namespace.to_string();
        }
    }

    if let Ok(namespace) = std::env::var("LIFELINE_NAMESPACE") {
        if !namespace.trim().is_empty() {
            return namespace.trim().to_string();
        }
    }

    DEFAULT_NAMESPACE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_defaults_to_global() {
        // Without an explicit path this resolves under the home dir
        // (or the env overrides, which still end with the same name).
        let path = resolve_db_path(None).unwrap();
        assert!(path.to_string_lossy().contains("lifeline"));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_lifeline_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("/test/"));
        assert_ne!(global.join("data").join("lifeline.db"), test);
    }

    #[test]
    fn test_resolve_namespace_explicit_wins() {
        assert_eq!(resolve_namespace(Some("safety_net")), "safety_net");
        assert_eq!(resolve_namespace(Some("")), DEFAULT_NAMESPACE.to_string());
    }

    #[test]
    fn test_default_namespace() {
        // No explicit value and (normally) no env override.
        let ns = resolve_namespace(None);
        assert!(!ns.is_empty());
    }
}
