//! Core data types for turns and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use thali_protocol::DEFAULT_SESSION;

/// One user message plus the assistant's corresponding final reply.
///
/// Immutable once appended to memory; ordered by arrival within a
/// (user, session) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// Turn identifier.
    pub id: Uuid,
    /// User the turn belongs to.
    pub user_id: String,
    /// Session partition within the user's history.
    pub session_id: String,
    /// Raw user message.
    pub user_message: String,
    /// Final assistant reply, clarifying question included.
    pub assistant_message: String,
    /// Derived counters and flags.
    pub metadata: TurnMetadata,
    /// Timestamp for the turn.
    pub created_at: DateTime<Utc>,
}

/// Derived counters and flags stored with each turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TurnMetadata {
    /// Whitespace token count of the user message.
    pub user_message_tokens: usize,
    /// Whitespace token count of the assistant reply.
    pub assistant_message_tokens: usize,
    /// Character length of the user message.
    pub user_message_chars: usize,
    /// Character length of the assistant reply.
    pub assistant_message_chars: usize,
    /// Whether the user message reads as a greeting.
    pub is_greeting: bool,
    /// Whether the user message touches food topics.
    pub mentions_food: bool,
}

impl TurnMetadata {
    /// Compute metadata for one exchange.
    pub fn for_exchange(user_message: &str, assistant_message: &str) -> Self {
        Self {
            user_message_tokens: user_message.split_whitespace().count(),
            assistant_message_tokens: assistant_message.split_whitespace().count(),
            user_message_chars: user_message.chars().count(),
            assistant_message_chars: assistant_message.chars().count(),
            is_greeting: is_greeting(user_message),
            mentions_food: mentions_food(user_message),
        }
    }
}

/// Key identifying one session partition of one user's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// User owning the partition.
    pub user_id: String,
    /// Session name within the user's history.
    pub session_id: String,
}

impl SessionKey {
    /// Build a key from borrowed parts.
    pub fn new(user_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    /// Session name.
    pub session_id: String,
    /// Number of turns recorded.
    pub turn_count: usize,
    /// Turns whose user message was a greeting.
    pub greeting_turns: usize,
    /// Turns whose user message touched food topics.
    pub food_turns: usize,
    /// Whitespace token total across both sides of every turn.
    pub total_tokens: usize,
    /// Timestamp of the first turn.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent turn.
    pub updated_at: DateTime<Utc>,
}

const GREETING_KEYWORDS: [&str; 8] = [
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "namaste",
    "namaskar",
];

const FOOD_KEYWORDS: [&str; 21] = [
    "food", "meal", "lunch", "dinner", "breakfast", "recipe", "cook", "eat", "hungry",
    "vegetarian", "vegan", "spicy", "healthy", "nutrition", "dal", "rice", "curry", "biryani",
    "paneer", "chicken", "fish",
];

/// Whether a message reads as a greeting.
pub fn is_greeting(message: &str) -> bool {
    let message = message.to_lowercase();
    let message = message.trim();
    GREETING_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// Whether a message touches food topics.
pub fn mentions_food(message: &str) -> bool {
    let message = message.to_lowercase();
    FOOD_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}
