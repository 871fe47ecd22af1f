//! Preference store providers.

use crate::error::PrefsError;
use crate::model::{PreferenceRecord, PreferenceUpdate};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Keyed store holding one preference record per user.
///
/// `get` never fails on absence; a missing record is `None`, which callers
/// treat as the explicit empty record. The only transactionality offered is
/// last-write-wins per record.
pub trait PreferenceStore: Send + Sync {
    /// Load the record for a user, or `None` when absent.
    fn get(&self, user_id: &str) -> Result<Option<PreferenceRecord>, PrefsError>;

    /// Replace the record for a user.
    fn put(&self, user_id: &str, record: &PreferenceRecord) -> Result<(), PrefsError>;

    /// Read-merge-write convenience applying the slot merge rules.
    fn merge(
        &self,
        user_id: &str,
        update: &PreferenceUpdate,
    ) -> Result<PreferenceRecord, PrefsError> {
        let mut record = self.get(user_id)?.unwrap_or_default();
        record.merge(update);
        self.put(user_id, &record)?;
        Ok(record)
    }
}

/// In-memory preference store for tests and ephemeral deployments.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    records: RwLock<HashMap<String, PreferenceRecord>>,
}

impl InMemoryPreferenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, user_id: &str) -> Result<Option<PreferenceRecord>, PrefsError> {
        Ok(self.records.read().get(user_id).cloned())
    }

    fn put(&self, user_id: &str, record: &PreferenceRecord) -> Result<(), PrefsError> {
        debug!("storing preference record (user_id={user_id})");
        self.records
            .write()
            .insert(user_id.to_string(), record.clone());
        Ok(())
    }
}

/// File-backed preference store keeping one JSON document per user.
///
/// Writes go through a temp file and rename, so a record on disk is always
/// either the previous version or the fully merged one. User ids are
/// expected to be simple identifiers; other characters are mapped to `_`
/// when building file names.
pub struct JsonPreferenceStore {
    /// Root directory for record files.
    root: PathBuf,
    /// Serialize write access to record files.
    write_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    /// Create a new store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized preference store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Build the record file path for a user.
    fn record_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_stem(user_id)))
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, user_id: &str) -> Result<Option<PreferenceRecord>, PrefsError> {
        let path = self.record_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let mut raw = String::new();
        OpenOptions::new()
            .read(true)
            .open(&path)?
            .read_to_string(&mut raw)?;
        let record = serde_json::from_str(&raw)?;
        Ok(Some(record))
    }

    fn put(&self, user_id: &str, record: &PreferenceRecord) -> Result<(), PrefsError> {
        let _guard = self.write_lock.lock();
        let path = self.record_path(user_id);
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let body = serde_json::to_string_pretty(record)?;
            file.write_all(body.as_bytes())?;
        }
        std::fs::rename(&temp_path, &path)?;
        debug!("wrote preference record (user_id={user_id}, path={})", path.display());
        Ok(())
    }
}

/// Map a caller-supplied id onto a safe file stem.
fn sanitize_stem(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore, sanitize_stem};
    use crate::model::{MandatorySlot, PreferenceUpdate, SlotValue};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn get_returns_none_for_unknown_user() {
        let store = InMemoryPreferenceStore::new();
        assert_eq!(store.get("nobody").expect("get"), None);
    }

    #[test]
    fn repeated_reads_return_identical_records() {
        let store = InMemoryPreferenceStore::new();
        store
            .merge("u1", &PreferenceUpdate::single("restrictions", "vegetarian"))
            .expect("merge");
        let first = store.get("u1").expect("get").expect("record");
        let second = store.get("u1").expect("get").expect("record");
        assert_eq!(first, second);
    }

    #[test]
    fn merge_applies_scenario_a() {
        let store = InMemoryPreferenceStore::new();
        let update = PreferenceUpdate {
            restrictions: Some(SlotValue::tags(["vegetarian"])),
            allergies: Some(SlotValue::tags(["nuts"])),
            ..PreferenceUpdate::default()
        };
        let record = store.merge("u1", &update).expect("merge");

        assert_eq!(record.restrictions, SlotValue::tags(["vegetarian"]));
        assert_eq!(record.allergies, SlotValue::tags(["nuts"]));
        assert_eq!(record.missing_mandatory(), vec![MandatorySlot::Cuisines]);
    }

    #[test]
    fn merge_applies_scenario_b() {
        let store = InMemoryPreferenceStore::new();
        let record = store
            .merge("u1", &PreferenceUpdate::single("restrictions", "none"))
            .expect("merge");
        assert_eq!(record.restrictions, SlotValue::None);
        assert_eq!(
            record.missing_mandatory(),
            vec![MandatorySlot::Allergies, MandatorySlot::Cuisines]
        );
    }

    #[test]
    fn json_store_round_trips_records() {
        let temp = tempdir().expect("tempdir");
        let store = JsonPreferenceStore::new(temp.path()).expect("store");

        assert_eq!(store.get("u1").expect("get"), None);
        let record = store
            .merge("u1", &PreferenceUpdate::single("allergies", "nuts"))
            .expect("merge");
        let loaded = store.get("u1").expect("get").expect("record");
        assert_eq!(loaded, record);

        // a second store over the same root sees the same data
        let reopened = JsonPreferenceStore::new(temp.path()).expect("store");
        assert_eq!(reopened.get("u1").expect("get").expect("record"), record);
    }

    #[test]
    fn sanitize_stem_replaces_unsafe_characters() {
        assert_eq!(sanitize_stem("user@example.com"), "user_example.com");
        assert_eq!(sanitize_stem("plain-id_1"), "plain-id_1");
    }
}
