//! Store doubles.

use thali_prefs::{PrefsError, PreferenceRecord, PreferenceStore};

/// Preference store failing every operation.
#[derive(Debug, Clone)]
pub struct FailingPreferenceStore {
    message: String,
}

impl FailingPreferenceStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> PrefsError {
        PrefsError::Io(std::io::Error::other(self.message.clone()))
    }
}

impl PreferenceStore for FailingPreferenceStore {
    fn get(&self, _user_id: &str) -> Result<Option<PreferenceRecord>, PrefsError> {
        Err(self.error())
    }

    fn put(&self, _user_id: &str, _record: &PreferenceRecord) -> Result<(), PrefsError> {
        Err(self.error())
    }
}
