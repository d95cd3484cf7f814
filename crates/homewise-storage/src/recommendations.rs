//! redb-backed recommendation record store.
//!
//! Records are keyed by their UUIDv7 id, so a key-ordered scan is also a
//! chronological scan. Records are never deleted; the expiry sweep rewrites
//! pending records as expired in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{ReadableTable, TableDefinition};

use homewise_core::error::{Error, Result};
use homewise_core::storage::RecommendationStore;
use homewise_core::types::{Recommendation, RecommendationId, RecommendationStatus};

use crate::db::HomewiseDb;
use crate::error::StorageError;

const RECOMMENDATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("recommendations");

/// Persistent recommendation store.
pub struct RedbRecommendationStore {
    db: HomewiseDb,
}

impl RedbRecommendationStore {
    pub fn new(db: HomewiseDb) -> std::result::Result<Self, StorageError> {
        // Ensure the table exists so read transactions never fail on a
        // fresh database.
        let txn = db.raw().begin_write()?;
        txn.open_table(RECOMMENDATIONS)?;
        txn.commit()?;
        Ok(Self { db })
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Recommendation, StorageError> {
        serde_json::from_slice(bytes).map_err(StorageError::from)
    }

    fn encode(record: &Recommendation) -> std::result::Result<Vec<u8>, StorageError> {
        serde_json::to_vec(record).map_err(StorageError::from)
    }

    fn scan<F>(&self, mut keep: F) -> std::result::Result<Vec<Recommendation>, StorageError>
    where
        F: FnMut(&Recommendation) -> bool,
    {
        let txn = self.db.raw().begin_read()?;
        let table = txn.open_table(RECOMMENDATIONS)?;
        let mut records = Vec::new();
        for item in table.iter()? {
            let (_key, value) = item?;
            let record = Self::decode(value.value())?;
            if keep(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl RecommendationStore for RedbRecommendationStore {
    async fn insert(&self, record: &Recommendation) -> Result<()> {
        let key = record.id.to_string();
        let value = Self::encode(record)?;
        let txn = self.db.raw().begin_write().map_err(StorageError::from)?;
        {
            let mut table = txn.open_table(RECOMMENDATIONS).map_err(StorageError::from)?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    async fn get(&self, id: &RecommendationId) -> Result<Option<Recommendation>> {
        let key = id.to_string();
        let txn = self.db.raw().begin_read().map_err(StorageError::from)?;
        let table = txn.open_table(RECOMMENDATIONS).map_err(StorageError::from)?;
        match table.get(key.as_str()).map_err(StorageError::from)? {
            Some(guard) => Ok(Some(Self::decode(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn update(&self, record: &Recommendation) -> Result<()> {
        let key = record.id.to_string();
        let value = Self::encode(record)?;
        let txn = self.db.raw().begin_write().map_err(StorageError::from)?;
        {
            let mut table = txn.open_table(RECOMMENDATIONS).map_err(StorageError::from)?;
            if table.get(key.as_str()).map_err(StorageError::from)?.is_none() {
                return Err(Error::NotFound(format!("recommendation {key}")));
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    async fn transition(
        &self,
        id: &RecommendationId,
        to: RecommendationStatus,
    ) -> Result<Recommendation> {
        let key = id.to_string();
        let txn = self.db.raw().begin_write().map_err(StorageError::from)?;
        let updated = {
            let mut table = txn.open_table(RECOMMENDATIONS).map_err(StorageError::from)?;
            let mut record = match table.get(key.as_str()).map_err(StorageError::from)? {
                Some(guard) => Self::decode(guard.value())?,
                None => return Err(Error::NotFound(format!("recommendation {key}"))),
            };

            if record.status.is_terminal() {
                return Err(Error::AlreadyResolved {
                    id: key,
                    status: record.status,
                });
            }

            record.status = to;
            if matches!(
                to,
                RecommendationStatus::Confirmed | RecommendationStatus::Rejected
            ) {
                record.confirmed_at = Some(Utc::now());
            }

            let value = Self::encode(&record)?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
            record
        };
        txn.commit().map_err(StorageError::from)?;
        Ok(updated)
    }

    async fn list_by_status(
        &self,
        status: RecommendationStatus,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let mut records = self.scan(|r| r.status == status)?;
        // Keys are time-ordered, so the newest records are at the end.
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    async fn expire_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let stale: Vec<Recommendation> = self.scan(|r| {
            r.status == RecommendationStatus::Pending && r.created_at < cutoff
        })?;
        if stale.is_empty() {
            return Ok(0);
        }

        let txn = self.db.raw().begin_write().map_err(StorageError::from)?;
        {
            let mut table = txn.open_table(RECOMMENDATIONS).map_err(StorageError::from)?;
            for mut record in stale.iter().cloned() {
                record.status = RecommendationStatus::Expired;
                let key = record.id.to_string();
                let value = Self::encode(&record)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(StorageError::from)?;
            }
        }
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(count = stale.len(), "expired stale pending recommendations");
        Ok(stale.len())
    }

    async fn list_undelivered(&self) -> Result<Vec<Recommendation>> {
        Ok(self.scan(|r| r.status == RecommendationStatus::Pending && !r.is_delivered())?)
    }

    async fn count_by_status(&self) -> Result<Vec<(RecommendationStatus, usize)>> {
        let mut pending = 0usize;
        let mut confirmed = 0usize;
        let mut rejected = 0usize;
        let mut expired = 0usize;
        self.scan(|r| {
            match r.status {
                RecommendationStatus::Pending => pending += 1,
                RecommendationStatus::Confirmed => confirmed += 1,
                RecommendationStatus::Rejected => rejected += 1,
                RecommendationStatus::Expired => expired += 1,
            }
            false
        })?;
        Ok(vec![
            (RecommendationStatus::Pending, pending),
            (RecommendationStatus::Confirmed, confirmed),
            (RecommendationStatus::Rejected, rejected),
            (RecommendationStatus::Expired, expired),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewise_core::types::{DeviceControl, Mode, TimePeriod};

    fn store() -> RedbRecommendationStore {
        RedbRecommendationStore::new(HomewiseDb::memory().unwrap()).unwrap()
    }

    fn record(user: &str) -> Recommendation {
        Recommendation::new(
            user,
            "Turn on the AC?",
            "It is hot outside.",
            Some(DeviceControl::single(
                "air_conditioner",
                Some("ac_1".to_string()),
                "turn_on",
            )),
            Mode::Production,
            TimePeriod::Afternoon,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = store();
        let rec = record("user1");
        store.insert(&rec).await.unwrap();

        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Turn on the AC?");
        assert_eq!(loaded.status, RecommendationStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = store();
        let id = RecommendationId::generate();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_exactly_once() {
        let store = store();
        let rec = record("user1");
        store.insert(&rec).await.unwrap();

        let confirmed = store
            .transition(&rec.id, RecommendationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, RecommendationStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());

        // Second transition is rejected with a typed error and leaves the
        // record untouched.
        let err = store
            .transition(&rec.id, RecommendationStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved { .. }));
        let loaded = store.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RecommendationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_transition_unknown_id() {
        let store = store();
        let err = store
            .transition(
                &RecommendationId::generate(),
                RecommendationStatus::Confirmed,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expiry_sweep_marks_not_deletes() {
        let store = store();
        let mut old = record("user1");
        old.created_at = Utc::now() - chrono::Duration::hours(30);
        store.insert(&old).await.unwrap();
        let fresh = record("user1");
        store.insert(&fresh).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::hours(24);
        let count = store.expire_created_before(cutoff).await.unwrap();
        assert_eq!(count, 1);

        // The expired record is still present for audit.
        let expired = store.get(&old.id).await.unwrap().unwrap();
        assert_eq!(expired.status, RecommendationStatus::Expired);
        let untouched = store.get(&fresh.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, RecommendationStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_undelivered() {
        let store = store();
        let undelivered = record("user1");
        store.insert(&undelivered).await.unwrap();

        let mut delivered = record("user1");
        delivered.hardware_sent_at = Some(Utc::now());
        store.insert(&delivered).await.unwrap();

        let pending = store.list_undelivered().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, undelivered.id);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let store = store();
        let a = record("user1");
        store.insert(&a).await.unwrap();
        let b = record("user2");
        store.insert(&b).await.unwrap();
        store
            .transition(&b.id, RecommendationStatus::Rejected)
            .await
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        let get = |status: RecommendationStatus| {
            counts.iter().find(|(s, _)| *s == status).unwrap().1
        };
        assert_eq!(get(RecommendationStatus::Pending), 1);
        assert_eq!(get(RecommendationStatus::Rejected), 1);
        assert_eq!(get(RecommendationStatus::Confirmed), 0);
    }

    #[tokio::test]
    async fn test_list_by_status_newest_first() {
        let store = store();
        let first = record("user1");
        store.insert(&first).await.unwrap();
        let second = record("user2");
        store.insert(&second).await.unwrap();

        let pending = store
            .list_by_status(RecommendationStatus::Pending, 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, second.id);
        assert_eq!(pending[1].id, first.id);
    }
}
