//! Per-turn context handed to capability invocations.

use std::fmt;
use std::sync::Arc;
use thali_prefs::PreferenceStore;
use thali_protocol::CompletionEngine;

/// Context shared by every capability invocation within one turn.
#[derive(Clone)]
pub struct CapabilityContext {
    /// User the turn belongs to.
    pub user_id: String,
    /// Session partition for the turn.
    pub session_id: String,
    /// Preference store handle.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Completion engine handle for generation capabilities.
    pub engine: Arc<dyn CompletionEngine>,
    /// Retry budget for engine calls made by capabilities.
    pub max_attempts: usize,
}

impl fmt::Debug for CapabilityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityContext")
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
