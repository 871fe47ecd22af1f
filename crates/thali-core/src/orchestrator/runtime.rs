//! Turn execution: the agent loop.

use super::gate::PreferenceGate;
use super::prompt::{build_context_messages, build_system_instructions};
use crate::error::CoreError;
use crate::memory::ConversationMemory;
use crate::orchestrator::TurnOutcome;
use crate::types::{ConversationTurn, TurnMetadata};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use thali_config::AssistantConfig;
use thali_prefs::PreferenceStore;
use thali_protocol::{
    ChatMessage, CompletionEngine, CompletionOutcome, CompletionRequest, SideEffect, ToolError,
    retrying,
};
use thali_tools::{CapabilityContext, CapabilityRegistry};
use uuid::Uuid;

/// Reply used when the engine or a generation capability is unavailable.
pub(crate) const GENERATION_FALLBACK: &str =
    "Sorry, I'm having trouble processing your request right now.";

/// Reply used when the iteration ceiling is reached.
pub(crate) const ITERATION_LIMIT_FALLBACK: &str =
    "I couldn't finish working through that request. Please try again with a simpler message.";

/// Parameters for a single turn execution.
pub(crate) struct TurnParams {
    pub(crate) user_id: String,
    pub(crate) session_id: String,
    pub(crate) message: String,
}

/// Executes a single turn end-to-end.
pub(crate) struct TurnExecutor {
    /// Shared configuration snapshot.
    config: Arc<AssistantConfig>,
    /// Capability dispatch table.
    registry: CapabilityRegistry,
    /// Conversation memory handle.
    memory: ConversationMemory,
    /// Preference store handle.
    preferences: Arc<dyn PreferenceStore>,
    /// Completion engine boundary.
    engine: Arc<dyn CompletionEngine>,
    /// Post-generation clarification policy.
    gate: PreferenceGate,
}

impl TurnExecutor {
    /// Create a new executor over shared orchestrator state.
    pub(crate) fn new(
        config: Arc<AssistantConfig>,
        registry: CapabilityRegistry,
        memory: ConversationMemory,
        preferences: Arc<dyn PreferenceStore>,
        engine: Arc<dyn CompletionEngine>,
    ) -> Self {
        let gate = PreferenceGate::new(preferences.clone());
        Self {
            config,
            registry,
            memory,
            preferences,
            engine,
            gate,
        }
    }

    /// Run one turn to completion.
    ///
    /// The engine call is the sole suspension point; capability invocations
    /// run sequentially in request order between calls. Every failure mode
    /// short of a memory-store failure produces a reply rather than an
    /// error, so the caller always has something to show the user.
    pub(crate) async fn run_turn(&self, params: TurnParams) -> Result<TurnOutcome, CoreError> {
        let TurnParams {
            user_id,
            session_id,
            message,
        } = params;
        let turn_id = Uuid::new_v4();
        info!(
            "starting turn (user_id={user_id}, session_id={session_id}, turn_id={turn_id}, message_len={})",
            message.len()
        );

        let window = self.memory.read(
            &user_id,
            &session_id,
            self.config.orchestrator.context_window,
        )?;
        let system = build_system_instructions(
            self.config
                .orchestrator
                .additional_instruction_prompt
                .as_deref(),
        );
        let mut messages = build_context_messages(&window, &message);
        let capabilities = self.registry.specs();
        let ctx = CapabilityContext {
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            preferences: self.preferences.clone(),
            engine: self.engine.clone(),
            max_attempts: self.config.completion.max_attempts,
        };

        let mut generation_ran = false;
        let mut reply: Option<String> = None;
        let max_iterations = self.config.orchestrator.max_iterations.max(1);

        'turn: for iteration in 0..max_iterations {
            let request = CompletionRequest {
                system: system.clone(),
                messages: messages.clone(),
                capabilities: capabilities.clone(),
            };
            let outcome = match retrying(
                self.engine.as_ref(),
                &request,
                self.config.completion.max_attempts,
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        "completion unavailable (user_id={user_id}, turn_id={turn_id}, err={err})"
                    );
                    reply = Some(GENERATION_FALLBACK.to_string());
                    break 'turn;
                }
            };

            match outcome {
                CompletionOutcome::Message(text) => {
                    let text = text.trim();
                    reply = Some(if text.is_empty() {
                        GENERATION_FALLBACK.to_string()
                    } else {
                        text.to_string()
                    });
                    break 'turn;
                }
                CompletionOutcome::CapabilityCalls { calls, preamble } => {
                    debug!(
                        "engine requested capabilities (count={}, iteration={iteration}, turn_id={turn_id})",
                        calls.len()
                    );
                    if let Some(preamble) = preamble
                        && !preamble.trim().is_empty()
                    {
                        messages.push(ChatMessage::assistant(preamble));
                    }
                    for call in calls {
                        match self.registry.invoke(&ctx, &call.name, &call.arguments).await {
                            Ok(result) => {
                                if self.registry.side_effect(&call.name)
                                    == Some(SideEffect::Generate)
                                {
                                    generation_ran = true;
                                }
                                messages.push(ChatMessage::tool(format!(
                                    "{}: {result}",
                                    call.name
                                )));
                            }
                            Err(ToolError::GenerationUnavailable(err)) => {
                                error!(
                                    "generation capability unavailable (name={}, turn_id={turn_id}, err={err})",
                                    call.name
                                );
                                reply = Some(GENERATION_FALLBACK.to_string());
                                break 'turn;
                            }
                            Err(err) => {
                                warn!(
                                    "capability failed (name={}, turn_id={turn_id}, err={err})",
                                    call.name
                                );
                                messages
                                    .push(ChatMessage::tool(format!("{} failed: {err}", call.name)));
                            }
                        }
                    }
                }
            }
        }

        let mut reply = reply.unwrap_or_else(|| {
            warn!(
                "iteration ceiling reached (user_id={user_id}, turn_id={turn_id}, ceiling={max_iterations})"
            );
            ITERATION_LIMIT_FALLBACK.to_string()
        });

        // answer first, ask second
        self.gate.apply(&user_id, generation_ran, &mut reply);

        let turn = ConversationTurn {
            id: turn_id,
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            user_message: message.clone(),
            assistant_message: reply.clone(),
            metadata: TurnMetadata::for_exchange(&message, &reply),
            created_at: Utc::now(),
        };
        self.memory.append(&turn)?;

        info!(
            "completed turn (user_id={user_id}, session_id={session_id}, turn_id={turn_id}, reply_len={})",
            reply.len()
        );
        Ok(TurnOutcome {
            reply,
            session_id,
            turn_id,
        })
    }
}
