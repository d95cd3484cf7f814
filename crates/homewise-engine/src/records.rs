//! Recommendation record service: persistence, delivery, and lifecycle
//! maintenance around the store.
//!
//! A record becomes durable before the hardware push is attempted, so a push
//! failure can never lose a recommendation: it stays `Pending` and
//! undelivered until the next retry sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};

use homewise_core::storage::RecommendationStore;
use homewise_core::collaborators::HardwareChannel;
use homewise_core::types::{
    Mode, Recommendation, RecommendationId, RecommendationStatus, TimePeriod,
};

use crate::decision::RecommendationDraft;
use crate::error::Result;

/// Record counts per status.
#[derive(Debug, Clone, Default)]
pub struct RecordStatistics {
    pub pending: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub expired: usize,
}

impl RecordStatistics {
    pub fn total(&self) -> usize {
        self.pending + self.confirmed + self.rejected + self.expired
    }
}

/// Persists recommendation records and pushes them to the hardware channel.
pub struct RecommendationService {
    store: Arc<dyn RecommendationStore>,
    hardware: Arc<dyn HardwareChannel>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RecommendationStore>, hardware: Arc<dyn HardwareChannel>) -> Self {
        Self { store, hardware }
    }

    /// Persist a draft as a `Pending` record and push it to the hardware
    /// channel. A failed push leaves the record pending and undelivered.
    pub async fn create(
        &self,
        user_id: &str,
        draft: RecommendationDraft,
        mode: Mode,
        time_period: TimePeriod,
    ) -> Result<Recommendation> {
        let mut record = Recommendation::new(
            user_id,
            draft.title,
            draft.contents,
            draft.device_control,
            mode,
            time_period,
        );
        self.store.insert(&record).await?;
        tracing::info!(
            recommendation_id = %record.id,
            user_id,
            title = %record.title,
            "recommendation record created"
        );

        match self
            .hardware
            .push_recommendation(&record.id, &record.title, &record.contents)
            .await
        {
            Ok(()) => {
                record.hardware_sent_at = Some(Utc::now());
                self.store.update(&record).await?;
            }
            Err(e) => {
                tracing::warn!(
                    recommendation_id = %record.id,
                    error = %e,
                    "hardware push failed, record left undelivered"
                );
            }
        }
        Ok(record)
    }

    /// Load one record.
    pub async fn get(&self, id: &RecommendationId) -> Result<Option<Recommendation>> {
        Ok(self.store.get(id).await?)
    }

    /// Records with a given status, newest first.
    pub async fn get_by_status(
        &self,
        status: RecommendationStatus,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        Ok(self.store.list_by_status(status, limit).await?)
    }

    /// Transition a record out of `Pending`, exactly once.
    pub async fn transition(
        &self,
        id: &RecommendationId,
        to: RecommendationStatus,
    ) -> Result<Recommendation> {
        Ok(self.store.transition(id, to).await?)
    }

    /// Mark pending records older than `max_age_hours` as expired. Records
    /// are never deleted.
    pub async fn expire_older_than(&self, max_age_hours: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let expired = self.store.expire_created_before(cutoff).await?;
        if expired > 0 {
            tracing::info!(expired, "expired stale pending recommendations");
        }
        Ok(expired)
    }

    /// Re-push pending records that never reached the hardware channel.
    /// Returns the number delivered this pass.
    pub async fn retry_undelivered(&self) -> Result<usize> {
        let undelivered = self.store.list_undelivered().await?;
        let mut delivered = 0;
        for mut record in undelivered {
            match self
                .hardware
                .push_recommendation(&record.id, &record.title, &record.contents)
                .await
            {
                Ok(()) => {
                    record.hardware_sent_at = Some(Utc::now());
                    self.store.update(&record).await?;
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        recommendation_id = %record.id,
                        error = %e,
                        "hardware push retry failed"
                    );
                }
            }
        }
        Ok(delivered)
    }

    /// Record counts per status.
    pub async fn statistics(&self) -> Result<RecordStatistics> {
        let counts = self.store.count_by_status().await?;
        let mut stats = RecordStatistics::default();
        for (status, count) in counts {
            match status {
                RecommendationStatus::Pending => stats.pending = count,
                RecommendationStatus::Confirmed => stats.confirmed = count,
                RecommendationStatus::Rejected => stats.rejected = count,
                RecommendationStatus::Expired => stats.expired = count,
            }
        }
        Ok(stats)
    }
}
