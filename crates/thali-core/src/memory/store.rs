//! Turn persistence using JSONL rollouts.

use crate::types::ConversationTurn;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistent store abstraction for conversation turns.
///
/// A store holds every session of a user in one append-only log; clearing
/// a session is itself an append. Truncation for context windows is done by
/// readers and never mutates the log.
pub trait TurnStore: Send + Sync {
    /// Append a turn to the user's rollout.
    fn append(&self, turn: &ConversationTurn) -> Result<(), TurnStoreError>;
    /// Load all surviving turns for a user, across sessions, in append order.
    fn load(&self, user_id: &str) -> Result<Vec<ConversationTurn>, TurnStoreError>;
    /// Drop all turns of one session via a tombstone event.
    fn clear(&self, user_id: &str, session_id: &str) -> Result<(), TurnStoreError>;
}

/// Errors returned by turn stores.
#[derive(Debug, Error)]
pub enum TurnStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
}

/// Internal JSONL event representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RolloutEvent {
    SchemaVersion {
        version: u32,
    },
    Turn {
        turn: ConversationTurn,
    },
    Cleared {
        session_id: String,
        at: DateTime<Utc>,
    },
}

/// JSONL-backed turn store keeping one rollout file per user.
///
/// User ids are expected to be simple identifiers; other characters are
/// mapped to `_` when building file names.
pub struct JsonlTurnStore {
    /// Root directory for user rollouts.
    root: PathBuf,
    /// Serialize write access to rollout files.
    write_lock: Mutex<()>,
}

impl JsonlTurnStore {
    /// Create a new JSONL store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, TurnStoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized JSONL turn store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Build the rollout file path for a user.
    fn rollout_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", sanitize_stem(user_id)))
    }

    /// Append an event, writing the schema header on first touch.
    fn write_event(&self, user_id: &str, event: &RolloutEvent) -> Result<(), TurnStoreError> {
        let _guard = self.write_lock.lock();
        let path = self.rollout_path(user_id);
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if is_new {
            let header = serde_json::to_string(&RolloutEvent::SchemaVersion { version: 1 })?;
            writeln!(file, "{header}")?;
        }
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl TurnStore for JsonlTurnStore {
    fn append(&self, turn: &ConversationTurn) -> Result<(), TurnStoreError> {
        debug!(
            "appending turn event (user_id={}, session_id={}, turn_id={})",
            turn.user_id, turn.session_id, turn.id
        );
        self.write_event(&turn.user_id, &RolloutEvent::Turn { turn: turn.clone() })
    }

    fn load(&self, user_id: &str) -> Result<Vec<ConversationTurn>, TurnStoreError> {
        let path = self.rollout_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut turns: Vec<ConversationTurn> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RolloutEvent = serde_json::from_str(&line)?;
            match event {
                RolloutEvent::SchemaVersion { version } => {
                    if version > 1 {
                        return Err(TurnStoreError::UnsupportedSchema(version));
                    }
                }
                RolloutEvent::Turn { turn } => turns.push(turn),
                RolloutEvent::Cleared { session_id, .. } => {
                    turns.retain(|turn| turn.session_id != session_id);
                }
            }
        }
        Ok(turns)
    }

    fn clear(&self, user_id: &str, session_id: &str) -> Result<(), TurnStoreError> {
        if !self.rollout_path(user_id).exists() {
            return Ok(());
        }
        info!("clearing session (user_id={user_id}, session_id={session_id})");
        self.write_event(
            user_id,
            &RolloutEvent::Cleared {
                session_id: session_id.to_string(),
                at: Utc::now(),
            },
        )
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
