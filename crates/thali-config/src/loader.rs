//! JSON5 config file loading.

use crate::{AssistantConfig, ConfigError};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename.
const DEFAULT_CONFIG_FILE: &str = "thali.json5";
/// Default config directory under a project root.
const DEFAULT_CONFIG_DIR: &str = ".thali";

/// Load and decode a config file from an explicit path.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<AssistantConfig, ConfigError> {
    let path = path.as_ref();
    info!("loading config (path={})", path.display());
    let raw = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&raw)?;
    let config = serde_json::from_value(value)?;
    Ok(config)
}

/// Locate the config file under a directory, if any.
///
/// Checks `<root>/.thali/thali.json5` and then `<root>/thali.json5`.
pub fn discover_config(root: impl AsRef<Path>) -> Option<PathBuf> {
    let root = root.as_ref();
    let candidates = [
        root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        root.join(DEFAULT_CONFIG_FILE),
    ];
    candidates.into_iter().find(|path| path.is_file())
}

/// Load the discovered config under a directory, or defaults when absent.
pub fn load_or_default(root: impl AsRef<Path>) -> Result<AssistantConfig, ConfigError> {
    match discover_config(&root) {
        Some(path) => load_from_path(path),
        None => {
            debug!(
                "no config file found, using defaults (root={})",
                root.as_ref().display()
            );
            Ok(AssistantConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{discover_config, load_from_path, load_or_default};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_json5_with_comments_and_partial_sections() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("thali.json5");
        fs::write(
            &path,
            r#"{
                // tighten the loop for tests
                orchestrator: { max_iterations: 2 },
                storage: { enabled: true },
            }"#,
        )
        .expect("write");

        let config = load_from_path(&path).expect("load");
        assert_eq!(config.orchestrator.max_iterations, 2);
        assert_eq!(config.orchestrator.context_window, 10);
        assert_eq!(config.storage.enabled, true);
    }

    #[test]
    fn discover_prefers_dot_directory() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join(".thali")).expect("mkdir");
        fs::write(temp.path().join(".thali/thali.json5"), "{}").expect("write");
        fs::write(temp.path().join("thali.json5"), "{}").expect("write");

        let found = discover_config(temp.path()).expect("found");
        assert_eq!(found, temp.path().join(".thali/thali.json5"));
    }

    #[test]
    fn load_or_default_falls_back_to_defaults() {
        let temp = tempdir().expect("tempdir");
        let config = load_or_default(temp.path()).expect("load");
        assert_eq!(config.completion.max_attempts, 3);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("thali.json5");
        fs::write(&path, "{ orchestrator: { max_iterations: \"lots\" } }").expect("write");
        assert!(load_from_path(&path).is_err());
    }
}
