//! Short-term memory: bounded per-session interaction history.
//!
//! Each session holds at most `capacity` entries with FIFO eviction; the
//! oldest entry is discarded silently when the cap is exceeded. Entries are
//! never deleted individually — a session is only ever removed in full, by
//! [`ShortTermMemory::clear_session`] or the periodic
//! [`ShortTermMemory::cleanup_old_sessions`] sweep.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Default maximum interactions kept per session.
pub const DEFAULT_CAPACITY: usize = 10;

/// Sentinel summary returned for sessions with no history.
pub const NO_HISTORY_SUMMARY: &str = "no prior interactions";

/// One recorded device interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
    /// Action taken or recommended (e.g. "turn_on").
    pub action: String,
    /// Inferred intent behind the interaction.
    #[serde(default)]
    pub intent: Option<String>,
    /// `None` until user feedback arrives; then accepted or rejected.
    #[serde(default)]
    pub accepted: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEntry {
    pub fn new(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        device_type: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            device_type: device_type.into(),
            action: action.into(),
            intent: None,
            accepted: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_accepted(mut self, accepted: bool) -> Self {
        self.accepted = Some(accepted);
        self
    }
}

/// Per-session bounded history of recent device interactions.
pub struct ShortTermMemory {
    sessions: Arc<RwLock<HashMap<String, VecDeque<InteractionEntry>>>>,
    capacity: usize,
}

impl ShortTermMemory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Append an interaction, stamping it with the current time. The oldest
    /// entry is evicted when the session exceeds capacity.
    pub async fn add_interaction(&self, session_id: &str, mut entry: InteractionEntry) {
        entry.timestamp = Utc::now();

        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        if history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(entry);
        tracing::debug!(
            session_id,
            len = history.len(),
            "interaction added to short-term memory"
        );
    }

    /// Session history, oldest to newest, optionally truncated to the most
    /// recent `last_n` entries.
    pub async fn get_history(
        &self,
        session_id: &str,
        last_n: Option<usize>,
    ) -> Vec<InteractionEntry> {
        let sessions = self.sessions.read().await;
        let Some(history) = sessions.get(session_id) else {
            return Vec::new();
        };

        let entries: Vec<InteractionEntry> = history.iter().cloned().collect();
        match last_n {
            Some(n) if n < entries.len() => entries[entries.len() - n..].to_vec(),
            _ => entries,
        }
    }

    /// Render the most recent 3 entries as short lines for prompt injection.
    pub async fn get_context_summary(&self, session_id: &str) -> String {
        let history = self.get_history(session_id, Some(3)).await;
        if history.is_empty() {
            return NO_HISTORY_SUMMARY.to_string();
        }

        history
            .iter()
            .map(|e| format!("- {}: {}", e.device_name, e.action))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Remove a session in full.
    pub async fn clear_session(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            tracing::info!(session_id, "session cleared");
        }
    }

    /// Drop sessions whose newest entry is older than `max_age_hours`, plus
    /// any empty sessions. Called periodically, not on every access.
    /// Returns the number of sessions removed.
    pub async fn cleanup_old_sessions(&self, max_age_hours: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, history| {
            history
                .back()
                .map(|last| last.timestamp >= cutoff)
                .unwrap_or(false)
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, "old sessions cleaned up");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> InteractionEntry {
        InteractionEntry::new(
            format!("dev_{n}"),
            format!("Device {n}"),
            "air_conditioner",
            "turn_on",
        )
    }

    #[tokio::test]
    async fn test_fifo_eviction_holds_capacity() {
        let memory = ShortTermMemory::new();
        for i in 0..12 {
            memory.add_interaction("s1", entry(i)).await;
        }

        let history = memory.get_history("s1", None).await;
        assert_eq!(history.len(), 10);
        // The two oldest entries were evicted.
        assert_eq!(history[0].device_id, "dev_2");
        assert!(history.iter().all(|e| e.device_id != "dev_0"));
        assert!(history.iter().all(|e| e.device_id != "dev_1"));
        assert_eq!(history.last().unwrap().device_id, "dev_11");
    }

    #[tokio::test]
    async fn test_history_order_and_last_n() {
        let memory = ShortTermMemory::new();
        for i in 0..5 {
            memory.add_interaction("s1", entry(i)).await;
        }

        let all = memory.get_history("s1", None).await;
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].device_id, "dev_0");

        let last_two = memory.get_history("s1", Some(2)).await;
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].device_id, "dev_3");
        assert_eq!(last_two[1].device_id, "dev_4");

        // last_n larger than history returns everything
        let all_again = memory.get_history("s1", Some(100)).await;
        assert_eq!(all_again.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let memory = ShortTermMemory::new();
        assert!(memory.get_history("nope", None).await.is_empty());
        assert_eq!(memory.get_context_summary("nope").await, NO_HISTORY_SUMMARY);
    }

    #[tokio::test]
    async fn test_context_summary_renders_recent_three() {
        let memory = ShortTermMemory::new();
        for i in 0..5 {
            memory.add_interaction("s1", entry(i)).await;
        }

        let summary = memory.get_context_summary("s1").await;
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "- Device 2: turn_on");
        assert_eq!(lines[2], "- Device 4: turn_on");
    }

    #[tokio::test]
    async fn test_clear_session() {
        let memory = ShortTermMemory::new();
        memory.add_interaction("s1", entry(0)).await;
        memory.clear_session("s1").await;
        assert!(memory.get_history("s1", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_old_sessions() {
        let memory = ShortTermMemory::new();
        memory.add_interaction("fresh", entry(0)).await;

        // Fabricate a stale session by backdating its only entry.
        {
            let mut sessions = memory.sessions.write().await;
            let mut stale = entry(1);
            stale.timestamp = Utc::now() - Duration::hours(48);
            sessions.insert("stale".to_string(), VecDeque::from([stale]));
        }

        let removed = memory.cleanup_old_sessions(24).await;
        assert_eq!(removed, 1);
        assert_eq!(memory.session_count().await, 1);
        assert!(!memory.get_history("fresh", None).await.is_empty());
    }
}
