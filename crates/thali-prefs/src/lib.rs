//! Preference record model and store providers for Thali.

pub mod error;
pub mod model;
pub mod store;

/// Preference error type.
pub use error::PrefsError;
/// Record model, slot values, and merge rules.
pub use model::{MANDATORY_ORDER, MandatorySlot, NONE_SENTINEL, PreferenceRecord, PreferenceUpdate, SlotValue};
/// Store interface and default providers.
pub use store::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore};
