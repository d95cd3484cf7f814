//! Memory tiers for the Homewise recommendation engine.
//!
//! - **Short-term memory**: bounded per-session buffer of recent device
//!   interactions, used for conversational continuity in prompts.
//! - **Long-term memory**: durable per-user preference profiles that learn
//!   only from accepted recommendations.
//! - **Memory service**: a thin facade combining both for the decision
//!   engine.

pub mod error;
pub mod long_term;
pub mod service;
pub mod short_term;

pub use error::{MemoryError, Result};
pub use long_term::{LearningEvent, LongTermMemory};
pub use service::{MemoryContext, MemoryService};
pub use short_term::{InteractionEntry, ShortTermMemory, NO_HISTORY_SUMMARY};
