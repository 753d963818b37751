//! Persisted-version tracking
//!
//! Compares the version recorded in the store with the running binary's
//! version to classify the launch (first run, upgrade, unchanged). Future
//! settings migrations hang off the upgrade branch.

use super::store::Store;
use log::info;

/// Store key the last-seen app version is recorded under.
pub const VERSION_KEY: &str = "version";

/// Outcome of comparing the persisted version with the running one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChange {
    /// No version on record; the app has never run with this store.
    FirstRun,
    /// The binary is newer than the recorded version.
    Upgraded { from: String },
    /// Recorded and running versions match (or the record is newer, which
    /// happens after a downgrade and is treated the same way).
    Current,
}

/// Read the recorded version, record the running one, and report what
/// changed.
pub fn check_version(store: &Store) -> VersionChange {
    let current = env!("CARGO_PKG_VERSION");
    let change = match store.string(VERSION_KEY) {
        None => {
            info!("First run (v{current})");
            VersionChange::FirstRun
        }
        Some(recorded) if is_newer_version(current, &recorded) => {
            info!("Upgraded from v{recorded} to v{current}");
            VersionChange::Upgraded { from: recorded }
        }
        Some(_) => VersionChange::Current,
    };

    if change != VersionChange::Current {
        store.set_string(VERSION_KEY, current);
    }
    change
}

/// Compare two dotted version strings; true when `new` is strictly newer.
pub fn is_newer_version(new: &str, current: &str) -> bool {
    let parse_version =
        |v: &str| -> Vec<u32> { v.split('.').filter_map(|s| s.parse::<u32>().ok()).collect() };

    let new_parts = parse_version(new);
    let current_parts = parse_version(current);

    for (new_part, current_part) in new_parts.iter().zip(current_parts.iter()) {
        if new_part > current_part {
            return true;
        } else if new_part < current_part {
            return false;
        }
    }

    new_parts.len() > current_parts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_version_comparison() {
        assert!(is_newer_version("0.2.0", "0.1.9"));
        assert!(is_newer_version("0.1.10", "0.1.9"));
        assert!(is_newer_version("1.0.0", "0.9.9"));
        assert!(!is_newer_version("0.1.9", "0.1.9"));
        assert!(!is_newer_version("0.1.8", "0.1.9"));
    }

    #[test]
    fn test_first_run_records_version() {
        let dir = tempdir().unwrap();
        let store = Store::open_at(dir.path().join("store.json")).unwrap();

        assert_eq!(check_version(&store), VersionChange::FirstRun);
        assert_eq!(
            store.string(VERSION_KEY).as_deref(),
            Some(env!("CARGO_PKG_VERSION"))
        );

        // Second launch with the same binary is unremarkable.
        assert_eq!(check_version(&store), VersionChange::Current);
    }

    #[test]
    fn test_upgrade_detected_and_recorded() {
        let dir = tempdir().unwrap();
        let store = Store::open_at(dir.path().join("store.json")).unwrap();
        store.set_string(VERSION_KEY, "0.0.1");

        assert_eq!(
            check_version(&store),
            VersionChange::Upgraded {
                from: "0.0.1".to_string()
            }
        );
        assert_eq!(
            store.string(VERSION_KEY).as_deref(),
            Some(env!("CARGO_PKG_VERSION"))
        );
    }
}
