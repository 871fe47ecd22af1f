//! Orchestration core for the Thali meal assistant.
//!
//! The pieces fit together like this:
//! 1. **Context assembly** (`orchestrator::prompt`) - fixed instructions plus
//!    a bounded window of prior turns
//! 2. **Agent loop** (`orchestrator::runtime`) - completion calls and
//!    capability execution until a final answer or the iteration ceiling
//! 3. **Preference gate** (`orchestrator::gate`) - answer first, then at most
//!    one clarifying question for the highest-priority missing slot
//! 4. **Conversation memory** (`memory`) - per-user, per-session turn history
//!    with optional JSONL persistence

pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod types;

pub use error::CoreError;
pub use orchestrator::{Assistant, TurnOutcome};
