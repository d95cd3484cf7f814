//! redb-backed user preference store.

use async_trait::async_trait;
use redb::TableDefinition;

use homewise_core::error::Result;
use homewise_core::storage::PreferenceStore;
use homewise_core::types::PreferenceProfile;

use crate::db::HomewiseDb;
use crate::error::StorageError;

const PREFERENCES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_preferences");

/// Persistent preference profile store, keyed by user id.
pub struct RedbPreferenceStore {
    db: HomewiseDb,
}

impl RedbPreferenceStore {
    pub fn new(db: HomewiseDb) -> std::result::Result<Self, StorageError> {
        let txn = db.raw().begin_write()?;
        txn.open_table(PREFERENCES)?;
        txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl PreferenceStore for RedbPreferenceStore {
    async fn load(&self, user_id: &str) -> Result<Option<PreferenceProfile>> {
        let txn = self.db.raw().begin_read().map_err(StorageError::from)?;
        let table = txn.open_table(PREFERENCES).map_err(StorageError::from)?;
        match table.get(user_id).map_err(StorageError::from)? {
            Some(guard) => {
                let profile =
                    serde_json::from_slice(guard.value()).map_err(StorageError::from)?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, profile: &PreferenceProfile) -> Result<()> {
        let value = serde_json::to_vec(profile).map_err(StorageError::from)?;
        let txn = self.db.raw().begin_write().map_err(StorageError::from)?;
        {
            let mut table = txn.open_table(PREFERENCES).map_err(StorageError::from)?;
            table
                .insert(profile.user_id.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }
}
