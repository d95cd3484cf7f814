//! Confirmation handler: turns an asynchronous YES/NO answer into a state
//! transition, optional device execution, and a preference-learning event.

use std::sync::Arc;
use std::time::Duration;

use homewise_core::collaborators::DeviceExecutor;
use homewise_core::types::{Recommendation, RecommendationId, RecommendationStatus, UserResponse};
use homewise_memory::{LearningEvent, MemoryService};

use crate::error::Result;
use crate::records::RecommendationService;

/// Outcome of handling a user response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Confirmed and every device action executed.
    Executed,
    /// Confirmed, but at least one device action failed. No rollback; the
    /// record stays `Confirmed`.
    PartialSuccess,
    /// Rejected; nothing was executed.
    Rejected,
}

/// Handles YES/NO responses to pending recommendations.
pub struct ConfirmationHandler {
    records: Arc<RecommendationService>,
    executor: Arc<dyn DeviceExecutor>,
    memory: Arc<MemoryService>,
}

impl ConfirmationHandler {
    pub fn new(
        records: Arc<RecommendationService>,
        executor: Arc<dyn DeviceExecutor>,
        memory: Arc<MemoryService>,
    ) -> Self {
        Self {
            records,
            executor,
            memory,
        }
    }

    /// Apply a user response to a pending recommendation.
    ///
    /// Unknown ids fail with `NotFound`; already-resolved records fail with
    /// `AlreadyResolved`. Only the first response for a record has any
    /// effect.
    pub async fn confirm(
        &self,
        id: &RecommendationId,
        response: UserResponse,
    ) -> Result<ConfirmOutcome> {
        let to = match response {
            UserResponse::Yes => RecommendationStatus::Confirmed,
            UserResponse::No => RecommendationStatus::Rejected,
        };
        // The store transition is atomic, so a concurrent duplicate response
        // resolves to exactly one winner.
        let record = self.records.transition(id, to).await?;

        let outcome = match response {
            UserResponse::Yes => self.execute_actions(&record).await,
            UserResponse::No => {
                tracing::info!(recommendation_id = %id, "recommendation rejected");
                ConfirmOutcome::Rejected
            }
        };

        self.feed_learning(&record, response.accepted()).await?;
        Ok(outcome)
    }

    /// Execute every action in order, honoring per-action delays. A failure
    /// stops the sequence and downgrades the outcome; the confirmation
    /// itself stands.
    async fn execute_actions(&self, record: &Recommendation) -> ConfirmOutcome {
        let Some(control) = &record.device_control else {
            tracing::info!(
                recommendation_id = %record.id,
                "confirmed informational recommendation, nothing to execute"
            );
            return ConfirmOutcome::Executed;
        };
        let Some(device_id) = &control.device_id else {
            tracing::warn!(
                recommendation_id = %record.id,
                "confirmed control has no resolved device id"
            );
            return ConfirmOutcome::PartialSuccess;
        };

        for action in control.ordered_actions() {
            if action.delay_secs > 0 {
                tokio::time::sleep(Duration::from_secs(action.delay_secs)).await;
            }
            if let Err(e) = self.executor.execute(device_id, &action).await {
                tracing::error!(
                    recommendation_id = %record.id,
                    device_id,
                    action = %action.action,
                    error = %e,
                    "device action failed after confirmation"
                );
                return ConfirmOutcome::PartialSuccess;
            }
        }
        tracing::info!(
            recommendation_id = %record.id,
            device_id,
            "confirmed recommendation executed"
        );
        ConfirmOutcome::Executed
    }

    /// Feed the response into preference learning, keyed by the device type
    /// and the time period captured at creation. Session history already
    /// holds the proposal; a confirmation only updates the long-term model.
    async fn feed_learning(&self, record: &Recommendation, accepted: bool) -> Result<()> {
        let Some(control) = &record.device_control else {
            return Ok(());
        };

        let event = LearningEvent {
            device_type: control.device_type.clone(),
            time_period: record.time_period,
            parameters: serde_json::json!({
                "actions": control
                    .actions
                    .iter()
                    .map(|a| a.action.clone())
                    .collect::<Vec<_>>(),
            }),
            accepted: Some(accepted),
        };
        self.memory
            .long_term()
            .learn_from_interaction(&record.user_id, &event)
            .await?;
        Ok(())
    }
}
