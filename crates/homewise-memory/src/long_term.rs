//! Long-term memory: per-user learned preference profiles.
//!
//! Learning is accept-only: rejected or unanswered recommendations never
//! touch the pattern map, so only positive reinforcement shapes future
//! prompts. Profiles are created lazily on first access and updated
//! incrementally forever; each `(time period, device type)` pattern list is
//! capped, evicting oldest-first.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use homewise_core::storage::PreferenceStore;
use homewise_core::types::{PreferencePatch, PreferenceProfile, TimePeriod};

use crate::error::Result;

/// Default cap on each learned pattern list.
pub const DEFAULT_PATTERN_CAP: usize = 50;

/// Sentinel returned when no pattern matches the queried context.
pub const NO_PATTERN_INSIGHTS: &str = "no learned patterns";

/// Feedback event fed into preference learning after a user responds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub device_type: String,
    /// Time period captured when the recommendation was created.
    pub time_period: TimePeriod,
    /// Action parameters observed (e.g. the command and its arguments).
    pub parameters: serde_json::Value,
    /// `Some(true)` for accepted, `Some(false)` for rejected, `None` when no
    /// feedback has arrived. Only accepted events are learned.
    pub accepted: Option<bool>,
}

/// Per-user accumulated preference patterns backed by a document store.
pub struct LongTermMemory {
    store: Arc<dyn PreferenceStore>,
    cache: RwLock<HashMap<String, PreferenceProfile>>,
    /// Serializes read-modify-write per user to avoid lost pattern updates.
    user_locks: DashMap<String, Arc<Mutex<()>>>,
    pattern_cap: usize,
}

impl LongTermMemory {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            user_locks: DashMap::new(),
            pattern_cap: DEFAULT_PATTERN_CAP,
        }
    }

    pub fn with_pattern_cap(mut self, cap: usize) -> Self {
        self.pattern_cap = cap.max(1);
        self
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Profile for a user: cache, then store, then a cached default.
    pub async fn get_user_preferences(&self, user_id: &str) -> Result<PreferenceProfile> {
        if let Some(profile) = self.cache.read().await.get(user_id) {
            return Ok(profile.clone());
        }

        let profile = match self.store.load(user_id).await? {
            Some(profile) => profile,
            None => PreferenceProfile::default_for(user_id),
        };
        self.cache
            .write()
            .await
            .insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    /// Merge a patch into the stored profile (upsert) and refresh the cache.
    pub async fn update_user_preference(
        &self,
        user_id: &str,
        patch: &PreferencePatch,
    ) -> Result<PreferenceProfile> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut profile = match self.store.load(user_id).await? {
            Some(profile) => profile,
            None => PreferenceProfile::default_for(user_id),
        };
        patch.apply_to(&mut profile);
        self.store.save(&profile).await?;
        self.cache
            .write()
            .await
            .insert(user_id.to_string(), profile.clone());
        tracing::info!(user_id, "user preferences updated");
        Ok(profile)
    }

    /// Learn from a feedback event. No-op unless `accepted == Some(true)`.
    pub async fn learn_from_interaction(
        &self,
        user_id: &str,
        event: &LearningEvent,
    ) -> Result<()> {
        if event.accepted != Some(true) {
            return Ok(());
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut profile = match self.store.load(user_id).await? {
            Some(profile) => profile,
            None => PreferenceProfile::default_for(user_id),
        };

        let patterns = profile
            .time_patterns
            .entry(event.time_period)
            .or_default()
            .entry(event.device_type.clone())
            .or_default();
        patterns.push(event.parameters.clone());
        if patterns.len() > self.pattern_cap {
            let overflow = patterns.len() - self.pattern_cap;
            patterns.drain(..overflow);
        }
        profile.updated_at = chrono::Utc::now();

        self.store.save(&profile).await?;
        self.cache
            .write()
            .await
            .insert(user_id.to_string(), profile);
        tracing::info!(
            user_id,
            device_type = %event.device_type,
            period = %event.time_period,
            "pattern learned from accepted interaction"
        );
        Ok(())
    }

    /// Render learned patterns for the given time period as prompt text.
    pub async fn get_pattern_insights(
        &self,
        user_id: &str,
        time_period: TimePeriod,
    ) -> Result<String> {
        let profile = self.get_user_preferences(user_id).await?;

        // Nothing learned yet for this user at all.
        if profile.time_patterns.is_empty() && profile.favorite_devices.is_empty() {
            return Ok(NO_PATTERN_INSIGHTS.to_string());
        }

        let mut insights = Vec::new();
        if let Some(by_device) = profile.time_patterns.get(&time_period) {
            if !by_device.is_empty() {
                let mut device_types: Vec<&str> =
                    by_device.keys().map(String::as_str).collect();
                device_types.sort_unstable();
                insights.push(format!(
                    "devices often used in the {}: {}",
                    time_period,
                    device_types.join(", ")
                ));
            }
        }
        if !profile.favorite_devices.is_empty() {
            insights.push(format!(
                "favorite devices: {}",
                profile.favorite_devices.join(", ")
            ));
        }
        insights.push(format!(
            "preferred temperature: {}°C",
            profile.temperature_preference
        ));
        insights.push(format!(
            "preferred brightness: {}%",
            profile.brightness_preference
        ));

        Ok(insights.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use homewise_core::error::Result as CoreResult;

    /// In-memory preference store for tests.
    #[derive(Default)]
    struct InMemoryPrefs {
        profiles: RwLock<HashMap<String, PreferenceProfile>>,
    }

    #[async_trait]
    impl PreferenceStore for InMemoryPrefs {
        async fn load(&self, user_id: &str) -> CoreResult<Option<PreferenceProfile>> {
            Ok(self.profiles.read().await.get(user_id).cloned())
        }

        async fn save(&self, profile: &PreferenceProfile) -> CoreResult<()> {
            self.profiles
                .write()
                .await
                .insert(profile.user_id.clone(), profile.clone());
            Ok(())
        }
    }

    fn event(accepted: Option<bool>) -> LearningEvent {
        LearningEvent {
            device_type: "air_conditioner".to_string(),
            time_period: TimePeriod::Evening,
            parameters: serde_json::json!({"action": "turn_on"}),
            accepted,
        }
    }

    #[tokio::test]
    async fn test_default_profile_created_and_cached() {
        let memory = LongTermMemory::new(Arc::new(InMemoryPrefs::default()));
        let profile = memory.get_user_preferences("user1").await.unwrap();
        assert_eq!(profile.temperature_preference, 24);
        assert_eq!(profile.brightness_preference, 70);
        assert!(profile.time_patterns.is_empty());

        // Second read is served from cache.
        let again = memory.get_user_preferences("user1").await.unwrap();
        assert_eq!(again.user_id, "user1");
    }

    #[tokio::test]
    async fn test_accept_only_learning() {
        let store = Arc::new(InMemoryPrefs::default());
        let memory = LongTermMemory::new(store.clone());

        memory
            .learn_from_interaction("user1", &event(Some(false)))
            .await
            .unwrap();
        memory
            .learn_from_interaction("user1", &event(None))
            .await
            .unwrap();
        // Rejected and unanswered events leave no trace.
        assert!(store.profiles.read().await.get("user1").is_none());

        memory
            .learn_from_interaction("user1", &event(Some(true)))
            .await
            .unwrap();
        let profile = memory.get_user_preferences("user1").await.unwrap();
        let patterns = &profile.time_patterns[&TimePeriod::Evening]["air_conditioner"];
        assert_eq!(patterns.len(), 1);
    }

    #[tokio::test]
    async fn test_pattern_list_is_capped() {
        let memory =
            LongTermMemory::new(Arc::new(InMemoryPrefs::default())).with_pattern_cap(5);

        for i in 0..8 {
            let mut e = event(Some(true));
            e.parameters = serde_json::json!({"n": i});
            memory.learn_from_interaction("user1", &e).await.unwrap();
        }

        let profile = memory.get_user_preferences("user1").await.unwrap();
        let patterns = &profile.time_patterns[&TimePeriod::Evening]["air_conditioner"];
        assert_eq!(patterns.len(), 5);
        // Oldest entries were evicted.
        assert_eq!(patterns[0]["n"], 3);
        assert_eq!(patterns[4]["n"], 7);
    }

    #[tokio::test]
    async fn test_update_preference_upsert() {
        let memory = LongTermMemory::new(Arc::new(InMemoryPrefs::default()));
        let patch = PreferencePatch {
            temperature_preference: Some(21),
            ..Default::default()
        };
        let profile = memory
            .update_user_preference("user1", &patch)
            .await
            .unwrap();
        assert_eq!(profile.temperature_preference, 21);

        let cached = memory.get_user_preferences("user1").await.unwrap();
        assert_eq!(cached.temperature_preference, 21);
    }

    #[tokio::test]
    async fn test_insights_sentinel_for_unlearned_user() {
        let memory = LongTermMemory::new(Arc::new(InMemoryPrefs::default()));
        let insights = memory
            .get_pattern_insights("fresh", TimePeriod::Morning)
            .await
            .unwrap();
        assert_eq!(insights, NO_PATTERN_INSIGHTS);
    }

    #[tokio::test]
    async fn test_pattern_insights() {
        let memory = LongTermMemory::new(Arc::new(InMemoryPrefs::default()));
        memory
            .learn_from_interaction("user1", &event(Some(true)))
            .await
            .unwrap();

        let insights = memory
            .get_pattern_insights("user1", TimePeriod::Evening)
            .await
            .unwrap();
        assert!(insights.contains("air_conditioner"));
        assert!(insights.contains("24°C"));

        // A different period has no device patterns but still reports
        // stored defaults.
        let other = memory
            .get_pattern_insights("user1", TimePeriod::Morning)
            .await
            .unwrap();
        assert!(other.contains("preferred temperature"));
    }

    #[tokio::test]
    async fn test_concurrent_learning_no_lost_updates() {
        let memory = Arc::new(LongTermMemory::new(Arc::new(InMemoryPrefs::default())));

        let mut handles = Vec::new();
        for i in 0..10 {
            let memory = memory.clone();
            handles.push(tokio::spawn(async move {
                let mut e = event(Some(true));
                e.parameters = serde_json::json!({"n": i});
                memory.learn_from_interaction("user1", &e).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let profile = memory.get_user_preferences("user1").await.unwrap();
        let patterns = &profile.time_patterns[&TimePeriod::Evening]["air_conditioner"];
        assert_eq!(patterns.len(), 10);
    }
}
