//! Orchestrator core.

mod gate;
mod prompt;
mod runtime;

use crate::error::CoreError;
use crate::memory::{ConversationMemory, JsonlTurnStore, TurnStore};
use crate::types::{ConversationTurn, DEFAULT_SESSION, SessionSummary};
use directories::BaseDirs;
use log::{debug, info};
use runtime::{TurnExecutor, TurnParams};
use std::path::PathBuf;
use std::sync::Arc;
use thali_config::AssistantConfig;
use thali_prefs::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore};
use thali_protocol::{CapabilitySpec, CompletionEngine};
use thali_tools::CapabilityRegistry;
use thali_tools::builtins::register_builtins;
use uuid::Uuid;

/// Result payload for one handled turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final assistant reply, clarifying question included.
    pub reply: String,
    /// Session the turn was recorded under.
    pub session_id: String,
    /// Identifier of the recorded turn.
    pub turn_id: Uuid,
}

/// Main orchestration façade: owns the capability registry and memory, and
/// runs one turn at a time per (user, session).
///
/// The assistant is `Send + Sync`; turns for different users or sessions may
/// run concurrently, but callers must serialize turns within one session,
/// since interleaved merges can drop a mandatory-slot update.
pub struct Assistant {
    config: Arc<AssistantConfig>,
    registry: CapabilityRegistry,
    memory: ConversationMemory,
    executor: TurnExecutor,
}

impl Assistant {
    /// Construct an assistant with in-memory conversation history.
    pub fn new(
        config: AssistantConfig,
        preferences: Arc<dyn PreferenceStore>,
        engine: Arc<dyn CompletionEngine>,
    ) -> Self {
        Self::with_turn_store(config, preferences, engine, None)
    }

    /// Construct an assistant with an optional persistent turn store.
    pub fn with_turn_store(
        config: AssistantConfig,
        preferences: Arc<dyn PreferenceStore>,
        engine: Arc<dyn CompletionEngine>,
        turn_store: Option<Arc<dyn TurnStore>>,
    ) -> Self {
        let config = Arc::new(config);
        let registry = CapabilityRegistry::new();
        register_builtins(&registry);
        let memory = match turn_store {
            Some(store) => ConversationMemory::with_store(store),
            None => ConversationMemory::new(),
        };
        let executor = TurnExecutor::new(
            config.clone(),
            registry.clone(),
            memory.clone(),
            preferences,
            engine,
        );
        info!(
            "initialized assistant (capabilities={}, max_iterations={})",
            registry.list().len(),
            config.orchestrator.max_iterations
        );
        Self {
            config,
            registry,
            memory,
            executor,
        }
    }

    /// Construct an assistant with stores resolved from storage config.
    ///
    /// With storage disabled everything lives in memory; enabled storage
    /// resolves default roots under `~/.thali` when paths are omitted.
    pub fn from_config(
        config: AssistantConfig,
        engine: Arc<dyn CompletionEngine>,
    ) -> Result<Self, CoreError> {
        if !config.storage.enabled {
            return Ok(Self::new(
                config,
                Arc::new(InMemoryPreferenceStore::new()),
                engine,
            ));
        }
        let preferences_root =
            resolve_default_root(config.storage.preferences_path.as_ref(), "preferences")?;
        let turns_root = resolve_default_root(config.storage.turns_path.as_ref(), "sessions")?;
        let preferences = Arc::new(
            JsonPreferenceStore::new(preferences_root)
                .map_err(|err| CoreError::Store(err.to_string()))?,
        );
        let turn_store: Arc<dyn TurnStore> = Arc::new(
            JsonlTurnStore::new(turns_root).map_err(|err| CoreError::Memory(err.to_string()))?,
        );
        Ok(Self::with_turn_store(
            config,
            preferences,
            engine,
            Some(turn_store),
        ))
    }

    /// Return the shared configuration for this assistant.
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Handle one inbound turn for a user.
    ///
    /// `session_id` falls back to the `"default"` partition; the session is
    /// created on first reference. Returns the reply and the session it was
    /// recorded under.
    pub async fn handle_message(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<TurnOutcome, CoreError> {
        let session_id = resolve_session(session_id);
        self.executor
            .run_turn(TurnParams {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                message: message.to_string(),
            })
            .await
    }

    /// Read recent turns for a session, most recent last.
    pub fn conversation_history(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationTurn>, CoreError> {
        let limit = limit.unwrap_or(self.config.memory.read_limit);
        self.memory.read(user_id, resolve_session(session_id), limit)
    }

    /// Drop one session's conversation history.
    pub fn clear_session(&self, user_id: &str, session_id: Option<&str>) -> Result<(), CoreError> {
        debug!("clearing session (user_id={user_id})");
        self.memory.clear(user_id, resolve_session(session_id))
    }

    /// Whether a session has any recorded turns.
    pub fn session_exists(
        &self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<bool, CoreError> {
        self.memory.session_exists(user_id, resolve_session(session_id))
    }

    /// Summaries for every session of a user, most recently active first.
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, CoreError> {
        self.memory.list_sessions(user_id)
    }

    /// List registered capability names.
    pub fn list_capabilities(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Return the capability schemas presented to the engine.
    pub fn capability_specs(&self) -> Vec<CapabilitySpec> {
        self.registry.specs()
    }
}

/// Apply the default session partition when the caller omits one.
fn resolve_session(session_id: Option<&str>) -> &str {
    match session_id {
        Some(session) if !session.trim().is_empty() => session,
        _ => DEFAULT_SESSION,
    }
}

/// Resolve an absolute storage root for config-specified paths.
fn resolve_default_root(path: Option<&String>, fallback_dir: &str) -> Result<PathBuf, CoreError> {
    let cwd = std::env::current_dir().map_err(CoreError::Io)?;
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            debug!("using absolute storage root: {}", path.display());
            return Ok(path);
        }
        debug!(
            "resolving storage root relative to cwd: {}",
            cwd.join(&path).display()
        );
        return Ok(cwd.join(path));
    }

    if let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        debug!(
            "resolving storage root under home: {}",
            home.join(".thali").join(fallback_dir).display()
        );
        return Ok(home.join(".thali").join(fallback_dir));
    }

    Ok(cwd.join(".thali").join(fallback_dir))
}

#[cfg(test)]
mod tests {
    use super::{resolve_default_root, resolve_session};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn session_resolution_defaults_blank_names() {
        assert_eq!(resolve_session(None), "default");
        assert_eq!(resolve_session(Some("")), "default");
        assert_eq!(resolve_session(Some("  ")), "default");
        assert_eq!(resolve_session(Some("planning")), "planning");
    }

    #[test]
    fn resolve_default_root_respects_absolute_and_relative_paths() {
        let temp = tempdir().expect("tempdir");
        let absolute = temp.path().join("preferences");
        let absolute_str = absolute.to_string_lossy().to_string();
        let resolved =
            resolve_default_root(Some(&absolute_str), "preferences").expect("absolute");
        assert_eq!(resolved, absolute);

        let relative = "tmp/preferences".to_string();
        let cwd = std::env::current_dir().expect("cwd");
        let resolved = resolve_default_root(Some(&relative), "preferences").expect("relative");
        assert_eq!(resolved, cwd.join(&relative));
    }
}
