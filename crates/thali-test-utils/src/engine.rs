//! Completion engine doubles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use thali_protocol::{CompletionEngine, CompletionError, CompletionOutcome, CompletionRequest};

/// Engine returning the same final message on every call.
#[derive(Debug, Clone)]
pub struct FixedEngine {
    response: String,
}

impl FixedEngine {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionEngine for FixedEngine {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        Ok(CompletionOutcome::Message(self.response.clone()))
    }
}

/// Engine replaying a fixed script of results, one per call.
///
/// When the script runs out the engine keeps answering with a fixed final
/// message, so loops driven by a short script still terminate.
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<CompletionOutcome, CompletionError>>>,
    exhausted_response: String,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<CompletionOutcome, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted_response: "done".to_string(),
        }
    }

    pub fn with_exhausted_response(mut self, response: impl Into<String>) -> Self {
        self.exhausted_response = response.into();
        self
    }
}

#[async_trait]
impl CompletionEngine for ScriptedEngine {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => Ok(CompletionOutcome::Message(self.exhausted_response.clone())),
        }
    }
}

/// Engine failing every call with a provider error.
#[derive(Debug, Clone)]
pub struct FailingEngine {
    message: String,
}

impl FailingEngine {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionEngine for FailingEngine {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        Err(CompletionError::Provider(self.message.clone()))
    }
}

/// Engine failing a fixed number of calls before succeeding.
pub struct FlakyEngine {
    failures_left: Mutex<usize>,
    response: String,
}

impl FlakyEngine {
    pub fn new(failures: usize, response: impl Into<String>) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionEngine for FlakyEngine {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        let mut failures_left = self.failures_left.lock();
        if *failures_left > 0 {
            *failures_left -= 1;
            Err(CompletionError::Timeout)
        } else {
            Ok(CompletionOutcome::Message(self.response.clone()))
        }
    }
}

/// Engine recording every request it receives.
pub struct RecordingEngine {
    outcome: CompletionOutcome,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingEngine {
    /// Record requests while answering with a fixed final message.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_outcome(CompletionOutcome::Message(response.into()))
    }

    /// Record requests while answering with a fixed outcome.
    pub fn with_outcome(outcome: CompletionOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl CompletionEngine for RecordingEngine {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        self.requests.lock().push(request);
        Ok(self.outcome.clone())
    }
}
