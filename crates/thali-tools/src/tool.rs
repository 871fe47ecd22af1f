//! Capability trait definition and metadata spec.

use crate::context::CapabilityContext;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use thali_protocol::{CapabilitySpec, SideEffect, ToolError};

/// Interface for invokable capabilities.
///
/// Dispatch is a closed table keyed by name; every invocation is validated
/// against `args_schema` before `call` runs.
#[async_trait]
pub trait Capability: Send + Sync + Debug {
    /// Return the capability name.
    fn name(&self) -> &str;
    /// Return the capability description.
    fn description(&self) -> &str;
    /// Return the JSON schema for the argument bundle.
    fn args_schema(&self) -> Value;
    /// Return the declared side-effect class.
    fn side_effect(&self) -> SideEffect;

    /// Whether repeated calls with identical arguments return the same result.
    fn idempotent(&self) -> bool {
        matches!(self.side_effect(), SideEffect::Read | SideEffect::Compute)
    }

    /// Invoke the capability with a context and validated arguments.
    async fn call(&self, ctx: &CapabilityContext, args: Value) -> Result<Value, ToolError>;

    /// Build a `CapabilitySpec` describing this capability.
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
            side_effect: self.side_effect(),
        }
    }
}
