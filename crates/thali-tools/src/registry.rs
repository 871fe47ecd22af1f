//! Registry for capability implementations.

use crate::context::CapabilityContext;
use crate::schema::validate_args;
use crate::tool::Capability;
use log::debug;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thali_protocol::{CapabilitySpec, SideEffect, ToolError};

/// In-memory registry for capability implementations.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    /// Map of capability name to implementation.
    capabilities: Arc<RwLock<HashMap<String, Arc<dyn Capability>>>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability by name.
    pub fn register(&self, capability: Arc<dyn Capability>) {
        debug!("registering capability (name={})", capability.name());
        self.capabilities
            .write()
            .insert(capability.name().to_string(), capability);
    }

    /// Fetch a capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.read().get(name).cloned()
    }

    /// List registered capability names, sorted for stable presentation.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Return capability specs sorted by name.
    ///
    /// The sort keeps the schema block presented to the engine identical
    /// across runs, which reproducible conversation scripts rely on.
    pub fn specs(&self) -> Vec<CapabilitySpec> {
        let mut specs: Vec<CapabilitySpec> = self
            .capabilities
            .read()
            .values()
            .map(|capability| capability.spec())
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Return the declared side-effect class for a capability, if known.
    pub fn side_effect(&self, name: &str) -> Option<SideEffect> {
        self.get(name).map(|capability| capability.side_effect())
    }

    /// Validate arguments and run a capability.
    ///
    /// Unknown names and schema mismatches fail before anything executes;
    /// execution failures come back as typed errors, never panics.
    pub async fn invoke(
        &self,
        ctx: &CapabilityContext,
        name: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        let Some(capability) = self.get(name) else {
            return Err(ToolError::UnknownCapability(name.to_string()));
        };
        validate_args(&capability.args_schema(), args)?;
        debug!(
            "invoking capability (name={name}, user_id={}, side_effect={:?})",
            ctx.user_id,
            capability.side_effect()
        );
        capability.call(ctx, args.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::CapabilityRegistry;
    use crate::{Capability, CapabilityContext};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use thali_prefs::InMemoryPreferenceStore;
    use thali_protocol::{SideEffect, ToolError};
    use thali_test_utils::FixedEngine;

    #[derive(Debug)]
    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its input back"
        }

        fn args_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"],
            })
        }

        fn side_effect(&self) -> SideEffect {
            SideEffect::Compute
        }

        async fn call(&self, _ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError> {
            Ok(args["text"].clone())
        }
    }

    fn context() -> CapabilityContext {
        CapabilityContext {
            user_id: "u1".to_string(),
            session_id: "default".to_string(),
            preferences: Arc::new(InMemoryPreferenceStore::new()),
            engine: Arc::new(FixedEngine::new("unused")),
            max_attempts: 3,
        }
    }

    #[test]
    fn registry_tracks_capabilities_and_specs() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability));
        assert_eq!(registry.list(), vec!["echo".to_string()]);

        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].side_effect, SideEffect::Compute);
    }

    #[tokio::test]
    async fn invoke_validates_before_execution() {
        let registry = CapabilityRegistry::new();
        registry.register(Arc::new(EchoCapability));

        let result = registry
            .invoke(&context(), "echo", &json!({ "text": "hi" }))
            .await
            .expect("invoke");
        assert_eq!(result, json!("hi"));

        let err = registry
            .invoke(&context(), "echo", &json!({}))
            .await
            .expect_err("violation");
        assert!(matches!(err, ToolError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn invoke_rejects_unknown_names() {
        let registry = CapabilityRegistry::new();
        let err = registry
            .invoke(&context(), "nope", &json!({}))
            .await
            .expect_err("unknown");
        assert!(matches!(err, ToolError::UnknownCapability(_)));
    }
}
