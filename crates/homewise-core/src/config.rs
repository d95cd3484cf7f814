//! Shared configuration defaults and environment variable names.
//!
//! Keeping these in one place avoids each crate re-defining the same
//! constants and drift between them.

use std::time::Duration;

/// Default endpoint constants.
pub mod endpoints {
    pub const OLLAMA: &str = "http://localhost:11434";
    pub const WEATHER: &str = "http://localhost:9100";
    pub const DEVICE_GATEWAY: &str = "http://localhost:9000";
    pub const HARDWARE: &str = "http://localhost:8080";
}

/// Environment variable names.
pub mod env_vars {
    pub const OLLAMA_ENDPOINT: &str = "HOMEWISE_OLLAMA_ENDPOINT";
    pub const LLM_MODEL: &str = "HOMEWISE_LLM_MODEL";
    pub const WEATHER_ENDPOINT: &str = "HOMEWISE_WEATHER_ENDPOINT";
    pub const GATEWAY_ENDPOINT: &str = "HOMEWISE_GATEWAY_ENDPOINT";
    pub const HARDWARE_ENDPOINT: &str = "HOMEWISE_HARDWARE_ENDPOINT";
    pub const DATA_DIR: &str = "HOMEWISE_DATA_DIR";
}

/// Engine defaults.
pub mod defaults {
    /// Scheduler interval between cycles (30 minutes).
    pub const SCHEDULE_INTERVAL_SECS: u64 = 30 * 60;
    /// Maximum per-user pipelines running concurrently in one cycle.
    pub const MAX_PARALLEL_USERS: usize = 4;
    /// Short-term memory capacity per session.
    pub const SHORT_TERM_CAPACITY: usize = 10;
    /// Idle sessions older than this are dropped by cleanup.
    pub const SESSION_MAX_AGE_HOURS: i64 = 24;
    /// Pending recommendations older than this are marked expired.
    pub const RECOMMENDATION_EXPIRY_HOURS: i64 = 24;
    /// Cap on each (time period, device type) learned pattern list.
    pub const PATTERN_LIST_CAP: usize = 50;
    /// HTTP timeout for gateway/weather/hardware calls.
    pub const HTTP_TIMEOUT_SECS: u64 = 10;
    /// Timeout for LLM generation.
    pub const LLM_TIMEOUT_SECS: u64 = 60;
}

/// Tunables for the recommendation engine and its scheduler.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between scheduled cycles.
    pub schedule_interval: Duration,
    /// Bounded parallelism across per-user pipelines.
    pub max_parallel_users: usize,
    /// Pending records older than this many hours expire.
    pub recommendation_expiry_hours: i64,
    /// Sessions idle longer than this many hours are cleaned up.
    pub session_max_age_hours: i64,
    /// Short-term memory capacity per session.
    pub short_term_capacity: usize,
    /// Cap on each learned pattern list.
    pub pattern_list_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schedule_interval: Duration::from_secs(defaults::SCHEDULE_INTERVAL_SECS),
            max_parallel_users: defaults::MAX_PARALLEL_USERS,
            recommendation_expiry_hours: defaults::RECOMMENDATION_EXPIRY_HOURS,
            session_max_age_hours: defaults::SESSION_MAX_AGE_HOURS,
            short_term_capacity: defaults::SHORT_TERM_CAPACITY,
            pattern_list_cap: defaults::PATTERN_LIST_CAP,
        }
    }
}

impl EngineConfig {
    pub fn with_schedule_interval(mut self, interval: Duration) -> Self {
        self.schedule_interval = interval;
        self
    }

    pub fn with_max_parallel_users(mut self, max: usize) -> Self {
        self.max_parallel_users = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.schedule_interval, Duration::from_secs(1800));
        assert_eq!(config.short_term_capacity, 10);
        assert_eq!(config.max_parallel_users, 4);
    }

    #[test]
    fn test_parallelism_floor() {
        let config = EngineConfig::default().with_max_parallel_users(0);
        assert_eq!(config.max_parallel_users, 1);
    }
}
