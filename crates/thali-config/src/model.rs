//! Configuration schema for the assistant.

use serde::{Deserialize, Serialize};

/// Root config for the assistant core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssistantConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AssistantConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::new()
    }
}

/// Builder for assembling an `AssistantConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: AssistantConfig::default(),
        }
    }

    /// Replace the orchestrator configuration.
    pub fn orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.config.orchestrator = orchestrator;
        self
    }

    /// Replace the completion boundary configuration.
    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.config.completion = completion;
        self
    }

    /// Replace the conversation memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Finalize and return the built `AssistantConfig`.
    pub fn build(self) -> AssistantConfig {
        self.config
    }
}

/// Configuration for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Extra instructions appended to the fixed system prompt.
    #[serde(default)]
    pub additional_instruction_prompt: Option<String>,
    /// Hard ceiling on completion/execute cycles within one turn.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Number of prior turns included in the model-input context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            additional_instruction_prompt: None,
            max_iterations: default_max_iterations(),
            context_window: default_context_window(),
        }
    }
}

fn default_max_iterations() -> usize {
    5
}

fn default_context_window() -> usize {
    10
}

/// Configuration for the completion boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Attempts per engine call before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

/// Configuration for conversation memory reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Default limit for direct history reads.
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            read_limit: default_read_limit(),
        }
    }
}

fn default_read_limit() -> usize {
    50
}

/// Configuration for persistent storage of preferences and turns.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Whether records and turns are persisted at all.
    #[serde(default)]
    pub enabled: bool,
    /// Root directory for preference records.
    #[serde(default)]
    pub preferences_path: Option<String>,
    /// Root directory for conversation rollouts.
    #[serde(default)]
    pub turns_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{AssistantConfig, OrchestratorConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = AssistantConfig::default();
        assert_eq!(config.orchestrator.max_iterations, 5);
        assert_eq!(config.orchestrator.context_window, 10);
        assert_eq!(config.completion.max_attempts, 3);
        assert_eq!(config.memory.read_limit, 50);
        assert_eq!(config.storage.enabled, false);
    }

    #[test]
    fn builder_replaces_sections() {
        let config = AssistantConfig::builder()
            .orchestrator(OrchestratorConfig {
                max_iterations: 2,
                ..OrchestratorConfig::default()
            })
            .build();
        assert_eq!(config.orchestrator.max_iterations, 2);
        assert_eq!(config.completion.max_attempts, 3);
    }
}
