//! Document store traits for recommendation records and preference profiles.
//!
//! The persistence engine is not mandated; `homewise-storage` provides a redb
//! implementation and tests use in-memory databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{PreferenceProfile, Recommendation, RecommendationId, RecommendationStatus};

/// Store for recommendation records.
///
/// Records are never deleted; expiry marks them [`RecommendationStatus::Expired`]
/// to preserve audit history.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Persist a new record.
    async fn insert(&self, record: &Recommendation) -> Result<()>;

    /// Load a record by id.
    async fn get(&self, id: &RecommendationId) -> Result<Option<Recommendation>>;

    /// Overwrite an existing record (metadata updates such as
    /// `hardware_sent_at`). Fails with `NotFound` if absent.
    async fn update(&self, record: &Recommendation) -> Result<()>;

    /// Atomically transition a record out of `Pending`.
    ///
    /// Fails with `NotFound` for unknown ids and `AlreadyResolved` when the
    /// record is not pending. Sets `confirmed_at` for confirmed/rejected
    /// transitions. Returns the updated record.
    async fn transition(
        &self,
        id: &RecommendationId,
        to: RecommendationStatus,
    ) -> Result<Recommendation>;

    /// List records with a given status, newest first, up to `limit`.
    async fn list_by_status(
        &self,
        status: RecommendationStatus,
        limit: usize,
    ) -> Result<Vec<Recommendation>>;

    /// Mark pending records created before `cutoff` as expired. Returns the
    /// number of records expired.
    async fn expire_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Pending records that were never delivered to the hardware channel.
    async fn list_undelivered(&self) -> Result<Vec<Recommendation>>;

    /// Record counts per status.
    async fn count_by_status(&self) -> Result<Vec<(RecommendationStatus, usize)>>;
}

/// Store for per-user preference profiles.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Load a profile, or `None` if the user has no stored profile.
    async fn load(&self, user_id: &str) -> Result<Option<PreferenceProfile>>;

    /// Upsert a profile.
    async fn save(&self, profile: &PreferenceProfile) -> Result<()>;
}
