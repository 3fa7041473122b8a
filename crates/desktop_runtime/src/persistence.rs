//! Local full-state cache for instant rendering on next visit.
//!
//! The cache stores a serialized [`DesktopSnapshot`] under one key. Load
//! failures are never fatal: corrupt payloads and schema-version mismatches
//! are discarded and the caller falls back to a remote fetch.

use desktop_store_contract::StoreError;

use crate::model::{DesktopSnapshot, DESKTOP_SNAPSHOT_SCHEMA_VERSION};

/// Key the snapshot payload is stored under.
pub const SNAPSHOT_CACHE_KEY: &str = "desktop.snapshot.v1";

/// Raw string cache the snapshot is persisted through. Hosts back this with
/// whatever key-value storage the platform offers.
pub trait SnapshotCache {
    /// Returns the stored payload for `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `payload` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn save(&mut self, key: &str, payload: &str) -> Result<(), StoreError>;
}

/// In-memory [`SnapshotCache`] used in tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotCache {
    entries: std::collections::HashMap<String, String>,
}

impl SnapshotCache for MemorySnapshotCache {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, payload: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Loads the cached snapshot, discarding anything unusable.
///
/// Storage errors, malformed JSON, and schema-version mismatches all produce
/// `None` after a warning; the session then boots from the remote store.
pub fn load_cached_snapshot(cache: &dyn SnapshotCache) -> Option<DesktopSnapshot> {
    let payload = match cache.load(SNAPSHOT_CACHE_KEY) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(error) => {
            tracing::warn!(%error, "snapshot cache unreadable, booting from remote");
            return None;
        }
    };
    let snapshot: DesktopSnapshot = match serde_json::from_str(&payload) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::warn!(%error, "discarding corrupt snapshot cache");
            return None;
        }
    };
    if snapshot.schema_version != DESKTOP_SNAPSHOT_SCHEMA_VERSION {
        tracing::warn!(
            found = snapshot.schema_version,
            expected = DESKTOP_SNAPSHOT_SCHEMA_VERSION,
            "discarding snapshot cache with mismatched schema version",
        );
        return None;
    }
    Some(snapshot)
}

/// Serializes and stores `snapshot`.
///
/// # Errors
///
/// Returns [`StoreError`] when serialization or the backing write fails.
pub fn persist_snapshot(
    cache: &mut dyn SnapshotCache,
    snapshot: &DesktopSnapshot,
) -> Result<(), StoreError> {
    let payload =
        serde_json::to_string(snapshot).map_err(|error| StoreError::Remote(error.to_string()))?;
    cache.save(SNAPSHOT_CACHE_KEY, &payload)
}
