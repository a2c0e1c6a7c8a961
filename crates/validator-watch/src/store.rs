//! Filesystem persistence for the previous cycle's snapshot.
//!
//! Exactly one snapshot lives on disk. It is replaced wholesale after each
//! cycle; a missing or unreadable file simply means "no prior state".

use std::path::{Path, PathBuf};

use crate::error::WatchError;
use crate::snapshot::ValidatorSnapshot;

/// JSON file holding the last observed [`ValidatorSnapshot`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior snapshot. Never fails: corrupt state degrades to `None`.
    pub fn load(&self) -> Option<ValidatorSnapshot> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no prior state file");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "prior state unreadable, ignoring"
                );
                return None;
            }
        };

        match serde_json::from_slice::<ValidatorSnapshot>(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "prior state corrupt, ignoring"
                );
                None
            }
        }
    }

    /// Replace the persisted snapshot.
    ///
    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old snapshot or the new one.
    pub fn save(&self, snapshot: &ValidatorSnapshot) -> Result<(), WatchError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| WatchError::Persist(format!("serialize failed: {e}")))?;

        if let Some(parent_dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent_dir)
                .map_err(|e| WatchError::Persist(format!("{}: {e}", parent_dir.display())))?;
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)
            .map_err(|e| WatchError::Persist(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            WatchError::Persist(format!("{}: {e}", self.path.display()))
        })?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{CurrentValidator, KickoutEntry, NextValidator};
    use chrono::TimeZone;

    fn sample() -> ValidatorSnapshot {
        ValidatorSnapshot {
            epoch_start_height: 100,
            epoch_height: 9,
            kickout_state: Some(KickoutEntry {
                account_id: "pool.near".to_string(),
                reason: serde_json::json!({ "NotEnoughChunks": { "produced": 1, "expected": 10 } }),
            }),
            current_validator_state: Some(CurrentValidator {
                account_id: "pool.near".to_string(),
                public_key: "ed25519:key".to_string(),
                stake: "123".to_string(),
                is_slashed: false,
                shards: vec![1, 2],
                num_produced_blocks: 9,
                num_expected_blocks: 10,
                num_produced_chunks: 7,
                num_expected_chunks: 10,
            }),
            next_validator_state: Some(NextValidator {
                account_id: "pool.near".to_string(),
                public_key: "ed25519:key".to_string(),
                stake: "123".to_string(),
                shards: vec![1],
            }),
            observed_at: Some(chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn save_then_load_returns_same_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.save(&sample()).unwrap();
        assert_eq!(store.load(), Some(sample()));
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.save(&sample()).unwrap();
        let mut next = sample();
        next.epoch_start_height = 200;
        next.kickout_state = None;
        store.save(&next).unwrap();

        assert_eq!(store.load(), Some(next));
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn garbage_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, [0xff, 0x00, b'{', b'x']).unwrap();

        assert_eq!(StateStore::new(path.clone()).load(), None);
    }

    #[test]
    fn truncated_json_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"epochStartHeight": 10"#).unwrap();

        assert_eq!(StateStore::new(path.clone()).load(), None);
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/deeper/state.json"));
        store.save(&sample()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_into_unwritable_location_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let store = StateStore::new(blocker.join("state.json"));

        assert!(matches!(store.save(&sample()), Err(WatchError::Persist(_))));
    }
}
