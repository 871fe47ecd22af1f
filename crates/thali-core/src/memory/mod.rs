//! Per-user, per-session conversation memory with optional persistence.

mod store;

pub use store::{JsonlTurnStore, TurnStore, TurnStoreError};

use crate::error::CoreError;
use crate::types::{ConversationTurn, SessionKey, SessionSummary};
use log::debug;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Conversation memory facade used by the orchestrator.
///
/// Sessions are created on first reference and cleared only by explicit
/// caller request. Reads never mutate the stored log; window truncation
/// happens at read time.
#[derive(Clone, Default)]
pub struct ConversationMemory {
    /// In-memory turn cache keyed by (user, session).
    sessions: Arc<RwLock<HashMap<SessionKey, Vec<ConversationTurn>>>>,
    /// Users whose persisted rollout has been folded into the cache.
    loaded_users: Arc<RwLock<HashSet<String>>>,
    /// Optional persistent store for turns.
    turn_store: Option<Arc<dyn TurnStore>>,
}

impl ConversationMemory {
    /// Create a purely in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory backed by a persistent turn store.
    pub fn with_store(turn_store: Arc<dyn TurnStore>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            loaded_users: Arc::new(RwLock::new(HashSet::new())),
            turn_store: Some(turn_store),
        }
    }

    /// Fold a user's persisted turns into the cache on first reference.
    fn ensure_user_loaded(&self, user_id: &str) -> Result<(), CoreError> {
        let Some(store) = &self.turn_store else {
            return Ok(());
        };
        let mut loaded = self.loaded_users.write();
        if loaded.contains(user_id) {
            return Ok(());
        }
        let turns = store
            .load(user_id)
            .map_err(|err| CoreError::Memory(err.to_string()))?;
        debug!(
            "loaded persisted turns (user_id={user_id}, count={})",
            turns.len()
        );
        let mut sessions = self.sessions.write();
        for turn in turns {
            let key = SessionKey::new(&turn.user_id, &turn.session_id);
            sessions.entry(key).or_default().push(turn);
        }
        loaded.insert(user_id.to_string());
        Ok(())
    }

    /// Append a turn, persisting it first when a store is configured.
    ///
    /// The store write happens before the cache insert so the cache never
    /// holds a turn the store lost.
    pub fn append(&self, turn: &ConversationTurn) -> Result<(), CoreError> {
        self.ensure_user_loaded(&turn.user_id)?;
        if let Some(store) = &self.turn_store {
            store
                .append(turn)
                .map_err(|err| CoreError::Memory(err.to_string()))?;
        }
        debug!(
            "appending turn (user_id={}, session_id={}, turn_id={})",
            turn.user_id, turn.session_id, turn.id
        );
        let key = SessionKey::new(&turn.user_id, &turn.session_id);
        self.sessions.write().entry(key).or_default().push(turn.clone());
        Ok(())
    }

    /// Read up to `limit` most recent turns, ordered most-recent-last.
    pub fn read(
        &self,
        user_id: &str,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, CoreError> {
        self.ensure_user_loaded(user_id)?;
        let sessions = self.sessions.read();
        let Some(turns) = sessions.get(&SessionKey::new(user_id, session_id)) else {
            return Ok(Vec::new());
        };
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    /// Drop one session's turns from cache and store.
    pub fn clear(&self, user_id: &str, session_id: &str) -> Result<(), CoreError> {
        self.ensure_user_loaded(user_id)?;
        if let Some(store) = &self.turn_store {
            store
                .clear(user_id, session_id)
                .map_err(|err| CoreError::Memory(err.to_string()))?;
        }
        self.sessions
            .write()
            .remove(&SessionKey::new(user_id, session_id));
        Ok(())
    }

    /// Whether any turns exist for the session.
    pub fn session_exists(&self, user_id: &str, session_id: &str) -> Result<bool, CoreError> {
        self.ensure_user_loaded(user_id)?;
        let sessions = self.sessions.read();
        Ok(sessions
            .get(&SessionKey::new(user_id, session_id))
            .is_some_and(|turns| !turns.is_empty()))
    }

    /// Summaries for every session of a user, most recently active first.
    pub fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, CoreError> {
        self.ensure_user_loaded(user_id)?;
        let sessions = self.sessions.read();
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .filter(|(key, turns)| key.user_id == user_id && !turns.is_empty())
            .map(|(key, turns)| summarize(&key.session_id, turns))
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

/// Build a summary for one session's turns.
fn summarize(session_id: &str, turns: &[ConversationTurn]) -> SessionSummary {
    let total_tokens = turns
        .iter()
        .map(|turn| turn.metadata.user_message_tokens + turn.metadata.assistant_message_tokens)
        .sum();
    SessionSummary {
        session_id: session_id.to_string(),
        turn_count: turns.len(),
        greeting_turns: turns.iter().filter(|turn| turn.metadata.is_greeting).count(),
        food_turns: turns.iter().filter(|turn| turn.metadata.mentions_food).count(),
        total_tokens,
        created_at: turns.first().map(|turn| turn.created_at).unwrap_or_default(),
        updated_at: turns.last().map(|turn| turn.created_at).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationMemory, JsonlTurnStore};
    use crate::types::{ConversationTurn, TurnMetadata};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn turn(user_id: &str, session_id: &str, message: &str) -> ConversationTurn {
        ConversationTurn {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            user_message: message.to_string(),
            assistant_message: "reply".to_string(),
            metadata: TurnMetadata::for_exchange(message, "reply"),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn read_truncates_to_most_recent_turns() {
        let memory = ConversationMemory::new();
        for index in 0..50 {
            memory
                .append(&turn("u1", "default", &format!("message {index}")))
                .expect("append");
        }

        let window = memory.read("u1", "default", 10).expect("read");
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].user_message, "message 40");
        assert_eq!(window[9].user_message, "message 49");

        // larger limits still see the older turns
        let full = memory.read("u1", "default", 100).expect("read");
        assert_eq!(full.len(), 50);
    }

    #[test]
    fn sessions_are_isolated_partitions() {
        let memory = ConversationMemory::new();
        memory.append(&turn("u1", "default", "hello")).expect("append");
        memory.append(&turn("u1", "planning", "lunch ideas")).expect("append");
        memory.append(&turn("u2", "default", "hi")).expect("append");

        assert_eq!(memory.read("u1", "default", 10).expect("read").len(), 1);
        assert_eq!(memory.read("u1", "planning", 10).expect("read").len(), 1);
        assert_eq!(memory.read("u2", "planning", 10).expect("read").len(), 0);

        memory.clear("u1", "default").expect("clear");
        assert_eq!(memory.read("u1", "default", 10).expect("read").len(), 0);
        assert_eq!(memory.read("u1", "planning", 10).expect("read").len(), 1);
    }

    #[test]
    fn summaries_aggregate_metadata() {
        let memory = ConversationMemory::new();
        memory.append(&turn("u1", "default", "hello")).expect("append");
        memory.append(&turn("u1", "default", "what's for dinner")).expect("append");

        let summaries = memory.list_sessions("u1").expect("list");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].session_id, "default");
        assert_eq!(summaries[0].turn_count, 2);
        assert_eq!(summaries[0].greeting_turns, 1);
        assert_eq!(summaries[0].food_turns, 1);
    }

    #[test]
    fn persisted_turns_survive_reconstruction() {
        let temp = tempdir().expect("tempdir");
        let recorded = turn("u1", "default", "persist me");
        {
            let store = Arc::new(JsonlTurnStore::new(temp.path()).expect("store"));
            let memory = ConversationMemory::with_store(store);
            memory.append(&recorded).expect("append");
        }

        let store = Arc::new(JsonlTurnStore::new(temp.path()).expect("store"));
        let memory = ConversationMemory::with_store(store);
        assert_eq!(memory.read("u1", "default", 10).expect("read"), vec![recorded]);
        assert_eq!(memory.session_exists("u1", "default").expect("exists"), true);
        assert_eq!(memory.session_exists("u1", "other").expect("exists"), false);
    }
}
