//! Shared test doubles for the Thali crates.

mod engine;
mod store;

pub use engine::{FailingEngine, FixedEngine, FlakyEngine, RecordingEngine, ScriptedEngine};
pub use store::FailingPreferenceStore;
