//! System instructions and context assembly.

use crate::types::ConversationTurn;
use thali_protocol::ChatMessage;

/// Fixed system instructions for the deployment.
pub(crate) const SYSTEM_INSTRUCTIONS: &str = "\
You are a helpful food recommendation assistant designed for Indian users. \
Your primary goal is to eliminate decision fatigue by providing simple, \
nutritious meal suggestions that users can easily make or ask someone to \
prepare.\n\n\
Key principles:\n\
1. SIMPLICITY FIRST: recommend easy-to-make, everyday meals\n\
2. NUTRITIONAL BALANCE: focus on balanced meals with proper macros\n\
3. INDIAN CONTEXT: understand Indian food culture, traditional and modern\n\
4. DECISION FATIGUE: make choices for users, do not overwhelm with options\n\
5. PRACTICAL: consider whether the meal can be made at home or ordered\n\
6. CRISP & MINIMAL: keep responses short, direct, and to the point\n\n\
You have capabilities for reading and updating user preferences, generating \
food recommendations, creating recipes, and suggesting recipe variations. \
Use the appropriate capability for what the user is asking; when the user \
states a dietary fact, record it before answering.";

/// Build the full system prompt, appending any configured extra instructions.
pub(crate) fn build_system_instructions(additional: Option<&str>) -> String {
    match additional.map(str::trim) {
        Some(extra) if !extra.is_empty() => {
            format!("{SYSTEM_INSTRUCTIONS}\n\nAdditional instructions:\n{extra}")
        }
        _ => SYSTEM_INSTRUCTIONS.to_string(),
    }
}

/// Assemble the model-input context from the turn window and current message.
pub(crate) fn build_context_messages(
    window: &[ConversationTurn],
    current_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(window.len() * 2 + 1);
    for turn in window {
        messages.push(ChatMessage::user(turn.user_message.clone()));
        messages.push(ChatMessage::assistant(turn.assistant_message.clone()));
    }
    messages.push(ChatMessage::user(current_message));
    messages
}
