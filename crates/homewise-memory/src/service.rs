//! Combined memory facade consumed by the decision engine.

use std::sync::Arc;

use homewise_core::storage::PreferenceStore;
use homewise_core::types::{PreferenceProfile, TimePeriod};

use crate::error::Result;
use crate::long_term::{LearningEvent, LongTermMemory};
use crate::short_term::{InteractionEntry, ShortTermMemory};

/// Everything the decision engine wants to know from memory.
#[derive(Debug, Clone)]
pub struct MemoryContext {
    /// Most recent interactions, oldest to newest.
    pub recent_history: Vec<InteractionEntry>,
    /// Short rendering of the last few interactions.
    pub context_summary: String,
    /// Learned pattern insights for the current time period.
    pub pattern_insights: String,
    /// Full preference profile.
    pub preferences: PreferenceProfile,
}

/// Short-term + long-term memory behind one handle.
pub struct MemoryService {
    short_term: ShortTermMemory,
    long_term: LongTermMemory,
}

impl MemoryService {
    pub fn new(preference_store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            short_term: ShortTermMemory::new(),
            long_term: LongTermMemory::new(preference_store),
        }
    }

    pub fn with_parts(short_term: ShortTermMemory, long_term: LongTermMemory) -> Self {
        Self {
            short_term,
            long_term,
        }
    }

    pub fn short_term(&self) -> &ShortTermMemory {
        &self.short_term
    }

    pub fn long_term(&self) -> &LongTermMemory {
        &self.long_term
    }

    /// Assemble the full memory context for one user/session.
    pub async fn full_context(
        &self,
        user_id: &str,
        session_id: &str,
        time_period: TimePeriod,
    ) -> Result<MemoryContext> {
        let recent_history = self.short_term.get_history(session_id, Some(5)).await;
        let context_summary = self.short_term.get_context_summary(session_id).await;
        let preferences = self.long_term.get_user_preferences(user_id).await?;
        let pattern_insights = self
            .long_term
            .get_pattern_insights(user_id, time_period)
            .await?;

        Ok(MemoryContext {
            recent_history,
            context_summary,
            pattern_insights,
            preferences,
        })
    }

    /// Record an interaction and feed it into preference learning.
    pub async fn add_and_learn(
        &self,
        user_id: &str,
        session_id: &str,
        entry: InteractionEntry,
        event: &LearningEvent,
    ) -> Result<()> {
        self.short_term.add_interaction(session_id, entry).await;
        self.long_term.learn_from_interaction(user_id, event).await
    }
}
