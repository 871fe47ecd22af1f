//! Boundary contract types shared across the Thali crates.

mod completion;
mod tool;

pub use completion::{
    CapabilityCall, CompletionEngine, CompletionError, CompletionOutcome, CompletionRequest,
    retrying,
};
pub use tool::ToolError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of the user owning a preference record and conversation history.
pub type UserId = String;

/// Session partition name within a user's conversation history.
pub type SessionName = String;

/// Session partition used when the caller does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Speaker role for a context message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
    /// Capability result observation fed back to the engine.
    Tool,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Parse a role from a lowercase string, defaulting unknown values to user.
    pub fn parse(value: &str) -> Self {
        match value {
            "system" => Role::System,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::User,
        }
    }
}

/// Message in the model-input context for one engine call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Build a capability observation message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

/// Side-effect class declared by a capability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Pure read of stored state.
    Read,
    /// Pure computation over supplied arguments.
    Compute,
    /// Mutation of stored state.
    Write,
    /// Call into the completion engine producing text.
    Generate,
}

/// Capability metadata presented to the completion engine.
///
/// This is the only place capability semantics reach the generation
/// boundary; changing a schema changes what the engine can request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilitySpec {
    /// Capability name used in invocation requests.
    pub name: String,
    /// Short natural-language description.
    pub description: String,
    /// JSON schema for the argument bundle.
    pub args_schema: Value,
    /// Declared side-effect class.
    pub side_effect: SideEffect,
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!(Role::parse("system"), Role::System);
        assert_eq!(Role::parse("assistant"), Role::Assistant);
        assert_eq!(Role::parse("tool"), Role::Tool);
        assert_eq!(Role::parse("anything else"), Role::User);
        assert_eq!(Role::Tool.as_str(), "tool");
    }

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::user("hi").role, Role::User);
        assert_eq!(ChatMessage::assistant("hello").role, Role::Assistant);
        assert_eq!(ChatMessage::tool("result").role, Role::Tool);
    }
}
