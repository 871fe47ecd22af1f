//! Configuration schema and loading for Thali.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{discover_config, load_from_path, load_or_default};
pub use model::{
    AssistantConfig, AssistantConfigBuilder, CompletionConfig, MemoryConfig, OrchestratorConfig,
    StorageConfig,
};
