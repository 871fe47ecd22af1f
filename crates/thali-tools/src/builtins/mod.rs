//! Builtin capabilities registered by the assistant.

mod generation;
mod preferences;

pub use generation::{GenerateRecipe, GenerateRecipeVariation, GenerateRecommendation};
pub use preferences::{
    AddSinglePreference, HasCompletePreferences, MissingMandatory, ReadPreferences,
    WritePreferences,
};

use crate::CapabilityRegistry;
use std::sync::Arc;

/// Register every builtin capability into a registry.
pub fn register_builtins(registry: &CapabilityRegistry) {
    registry.register(Arc::new(ReadPreferences));
    registry.register(Arc::new(WritePreferences));
    registry.register(Arc::new(AddSinglePreference));
    registry.register(Arc::new(MissingMandatory));
    registry.register(Arc::new(HasCompletePreferences));
    registry.register(Arc::new(GenerateRecommendation));
    registry.register(Arc::new(GenerateRecipe));
    registry.register(Arc::new(GenerateRecipeVariation));
}
