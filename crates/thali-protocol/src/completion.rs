//! Completion engine contract and the bounded retry combinator.

use crate::{CapabilitySpec, ChatMessage};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input bundle submitted to the completion engine for one call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    /// Static system instructions for the deployment.
    pub system: String,
    /// Ordered conversation context, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Capability schemas the engine may request invocations of.
    #[serde(default)]
    pub capabilities: Vec<CapabilitySpec>,
}

/// One capability invocation requested by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityCall {
    /// Capability name to invoke.
    pub name: String,
    /// Argument bundle, validated against the declared schema before execution.
    #[serde(default)]
    pub arguments: Value,
}

/// Engine output: a final message or a batch of requested invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum CompletionOutcome {
    /// Final natural-language answer.
    Message(String),
    /// Requested capability invocations, executed as an ordered batch.
    CapabilityCalls {
        calls: Vec<CapabilityCall>,
        /// Optional accompanying text preceding the invocations.
        #[serde(default)]
        preamble: Option<String>,
    },
}

/// Errors surfaced by completion engines.
///
/// Everything except `Exhausted` is considered transient and is retried by
/// [`retrying`]; the boundary cannot reliably distinguish a dying provider
/// from a hiccup, so provider errors are retried too.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The engine call timed out.
    #[error("completion request timed out")]
    Timeout,
    /// The engine rejected the call due to rate limiting.
    #[error("completion request was rate limited")]
    RateLimited,
    /// The engine returned output the adapter could not interpret.
    #[error("malformed engine output: {0}")]
    Malformed(String),
    /// Any other engine-side failure.
    #[error("provider error: {0}")]
    Provider(String),
    /// All retry attempts were consumed without a usable outcome.
    #[error("completion failed after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: String },
}

/// Text-completion boundary treated as a black box by the orchestrator.
///
/// Implementations decide, per call, whether to answer directly or to
/// request capability invocations; all non-determinism lives behind this
/// trait. The call must be cancel-safe: dropping the future leaves no
/// partial state behind in the core.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    /// Run one completion over the supplied context.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutcome, CompletionError>;
}

/// Submit a request, retrying failures up to `max_attempts` times.
///
/// No delay is inserted between attempts. Exhaustion yields
/// [`CompletionError::Exhausted`]; callers convert that into their fixed
/// fallback behavior rather than propagating it raw.
pub async fn retrying(
    engine: &dyn CompletionEngine,
    request: &CompletionRequest,
    max_attempts: usize,
) -> Result<CompletionOutcome, CompletionError> {
    let attempts = max_attempts.max(1);
    let mut last = String::new();
    for attempt in 1..=attempts {
        match engine.complete(request.clone()).await {
            Ok(outcome) => {
                if attempt > 1 {
                    debug!("completion recovered (attempt={attempt})");
                }
                return Ok(outcome);
            }
            Err(err) => {
                warn!("completion attempt failed (attempt={attempt}, max={attempts}, err={err})");
                last = err.to_string();
            }
        }
    }
    Err(CompletionError::Exhausted { attempts, last })
}

#[cfg(test)]
mod tests {
    use super::{
        CompletionEngine, CompletionError, CompletionOutcome, CompletionRequest, retrying,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    struct CountingEngine {
        calls: Mutex<usize>,
        fail_first: usize,
    }

    #[async_trait]
    impl CompletionEngine for CountingEngine {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionOutcome, CompletionError> {
            let mut calls = self.calls.lock();
            *calls += 1;
            if *calls <= self.fail_first {
                Err(CompletionError::Timeout)
            } else {
                Ok(CompletionOutcome::Message("ok".to_string()))
            }
        }
    }

    fn empty_request() -> CompletionRequest {
        CompletionRequest {
            system: String::new(),
            messages: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    #[tokio::test]
    async fn retrying_recovers_from_transient_failures() {
        let engine = CountingEngine {
            calls: Mutex::new(0),
            fail_first: 2,
        };
        let outcome = retrying(&engine, &empty_request(), 3).await.expect("outcome");
        assert_eq!(outcome, CompletionOutcome::Message("ok".to_string()));
        assert_eq!(*engine.calls.lock(), 3);
    }

    #[tokio::test]
    async fn retrying_exhausts_after_bound() {
        let engine = CountingEngine {
            calls: Mutex::new(0),
            fail_first: usize::MAX,
        };
        let err = retrying(&engine, &empty_request(), 3).await.expect_err("exhausted");
        match err {
            CompletionError::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*engine.calls.lock(), 3);
    }

    #[tokio::test]
    async fn retrying_treats_zero_attempts_as_one() {
        let engine = CountingEngine {
            calls: Mutex::new(0),
            fail_first: 0,
        };
        let outcome = retrying(&engine, &empty_request(), 0).await.expect("outcome");
        assert_eq!(outcome, CompletionOutcome::Message("ok".to_string()));
        assert_eq!(*engine.calls.lock(), 1);
    }

    #[test]
    fn outcome_round_trips_through_json() {
        let outcome = CompletionOutcome::CapabilityCalls {
            calls: vec![super::CapabilityCall {
                name: "read_preferences".to_string(),
                arguments: serde_json::json!({ "user_id": "u1" }),
            }],
            preamble: Some("checking your preferences".to_string()),
        };
        let encoded = serde_json::to_value(&outcome).expect("serialize");
        let decoded: CompletionOutcome = serde_json::from_value(encoded).expect("deserialize");
        assert_eq!(decoded, outcome);
    }
}
