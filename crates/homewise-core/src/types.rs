//! Shared data model for the recommendation engine.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, time-ordered recommendation identifier (UUIDv7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationId(uuid::Uuid);

impl RecommendationId {
    /// Generate a new id. UUIDv7 is monotonically sortable by creation time,
    /// which keeps record scans in chronological order.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse an id from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

impl fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Time-of-day bucket used for context and preference learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimePeriod {
    /// Bucket an hour (0-23) into a time period.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=21 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season, derived from the month. Included in prompt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Derive the season from a month number (1-12).
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// Which context source a recommendation was produced from. Does not affect
/// engine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Demo,
    Production,
}

/// Lifecycle status of a recommendation record.
///
/// A record transitions out of `Pending` exactly once; all other states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    Confirmed,
    Rejected,
    Expired,
}

impl RecommendationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecommendationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Pending => "pending",
            RecommendationStatus::Confirmed => "confirmed",
            RecommendationStatus::Rejected => "rejected",
            RecommendationStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device action within a recommendation, executed in `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceAction {
    /// Action command (e.g. "turn_on", "temp_24", "wind_auto").
    pub action: String,
    /// Execution order within the control sequence (1-based).
    #[serde(default = "DeviceAction::default_order")]
    pub order: u32,
    /// Delay before executing this action, in seconds.
    #[serde(default)]
    pub delay_secs: u64,
    /// Optional human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

impl DeviceAction {
    fn default_order() -> u32 {
        1
    }

    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            order: 1,
            delay_secs: 0,
            description: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_delay_secs(mut self, delay_secs: u64) -> Self {
        self.delay_secs = delay_secs;
        self
    }
}

/// Device control payload attached to a recommendation.
///
/// A recommendation without device control is purely informational. When
/// present, `actions` must be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceControl {
    /// Device type (e.g. "air_conditioner", "air_purifier").
    pub device_type: String,
    /// Target device id, if already resolved against the inventory.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Ordered sub-actions.
    pub actions: Vec<DeviceAction>,
}

impl DeviceControl {
    /// A control with a single action.
    pub fn single(
        device_type: impl Into<String>,
        device_id: Option<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            device_type: device_type.into(),
            device_id,
            actions: vec![DeviceAction::new(action)],
        }
    }

    /// Whether the control payload is actionable.
    pub fn is_valid(&self) -> bool {
        !self.device_type.is_empty() && !self.actions.is_empty()
    }

    /// Actions sorted by execution order.
    pub fn ordered_actions(&self) -> Vec<DeviceAction> {
        let mut actions = self.actions.clone();
        actions.sort_by_key(|a| a.order);
        actions
    }
}

/// A proposed device action awaiting user approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub user_id: String,
    pub title: String,
    pub contents: String,
    /// Absent for purely informational recommendations.
    #[serde(default)]
    pub device_control: Option<DeviceControl>,
    pub status: RecommendationStatus,
    pub mode: Mode,
    /// Time period captured at creation. Preference learning is keyed by
    /// this, not by the time the user eventually responds.
    pub time_period: TimePeriod,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hardware_sent_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        contents: impl Into<String>,
        device_control: Option<DeviceControl>,
        mode: Mode,
        time_period: TimePeriod,
    ) -> Self {
        Self {
            id: RecommendationId::generate(),
            user_id: user_id.into(),
            title: title.into(),
            contents: contents.into(),
            device_control,
            status: RecommendationStatus::Pending,
            mode,
            time_period,
            created_at: Utc::now(),
            confirmed_at: None,
            hardware_sent_at: None,
        }
    }

    /// Whether the record was pushed to the hardware channel.
    pub fn is_delivered(&self) -> bool {
        self.hardware_sent_at.is_some()
    }
}

/// A device as reported by the external device gateway. Read-only to the
/// engine; execution is delegated to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub device_type: String,
    pub device_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub current_state: serde_json::Value,
    /// Whether the gateway reports this device as controllable right now.
    #[serde(default)]
    pub can_control: bool,
}

/// User response to a pushed recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserResponse {
    Yes,
    No,
}

impl UserResponse {
    pub fn accepted(&self) -> bool {
        matches!(self, UserResponse::Yes)
    }
}

impl FromStr for UserResponse {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" | "Y" => Ok(UserResponse::Yes),
            "NO" | "N" => Ok(UserResponse::No),
            other => Err(crate::error::Error::Validation(format!(
                "invalid user response: {other}"
            ))),
        }
    }
}

/// Per-user long-lived preference profile.
///
/// `time_patterns` accumulates parameter sets from accepted interactions
/// only; the long-term memory component is the sole writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub user_id: String,
    pub temperature_preference: i32,
    pub brightness_preference: u32,
    #[serde(default)]
    pub favorite_devices: Vec<String>,
    /// time period -> device type -> observed parameter sets.
    #[serde(default)]
    pub time_patterns: HashMap<TimePeriod, HashMap<String, Vec<serde_json::Value>>>,
    pub updated_at: DateTime<Utc>,
}

/// Default preferred temperature in °C.
pub const DEFAULT_TEMPERATURE_PREFERENCE: i32 = 24;
/// Default preferred brightness in percent.
pub const DEFAULT_BRIGHTNESS_PREFERENCE: u32 = 70;

impl PreferenceProfile {
    /// Default profile for a user with no learning history.
    pub fn default_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            temperature_preference: DEFAULT_TEMPERATURE_PREFERENCE,
            brightness_preference: DEFAULT_BRIGHTNESS_PREFERENCE,
            favorite_devices: Vec::new(),
            time_patterns: HashMap::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Partial update to a preference profile (upsert semantics).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencePatch {
    #[serde(default)]
    pub temperature_preference: Option<i32>,
    #[serde(default)]
    pub brightness_preference: Option<u32>,
    #[serde(default)]
    pub favorite_devices: Option<Vec<String>>,
    #[serde(default)]
    pub time_patterns: Option<HashMap<TimePeriod, HashMap<String, Vec<serde_json::Value>>>>,
}

impl PreferencePatch {
    /// Merge this patch into a profile.
    pub fn apply_to(&self, profile: &mut PreferenceProfile) {
        if let Some(temp) = self.temperature_preference {
            profile.temperature_preference = temp;
        }
        if let Some(brightness) = self.brightness_preference {
            profile.brightness_preference = brightness;
        }
        if let Some(favorites) = &self.favorite_devices {
            profile.favorite_devices = favorites.clone();
        }
        if let Some(patterns) = &self.time_patterns {
            profile.time_patterns = patterns.clone();
        }
        profile.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_period_boundaries() {
        assert_eq!(TimePeriod::from_hour(5), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(11), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(12), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(17), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(18), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(21), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(22), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(4), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(0), TimePeriod::Night);
    }

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
    }

    #[test]
    fn test_recommendation_ids_are_sortable() {
        let a = RecommendationId::generate();
        let b = RecommendationId::generate();
        // UUIDv7 ids generated in sequence sort chronologically.
        assert!(a.to_string() <= b.to_string());
    }

    #[test]
    fn test_device_control_validity() {
        let control = DeviceControl::single("air_conditioner", None, "turn_on");
        assert!(control.is_valid());

        let empty = DeviceControl {
            device_type: "air_conditioner".to_string(),
            device_id: None,
            actions: Vec::new(),
        };
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_ordered_actions() {
        let control = DeviceControl {
            device_type: "air_conditioner".to_string(),
            device_id: Some("ac_1".to_string()),
            actions: vec![
                DeviceAction::new("temp_24").with_order(2),
                DeviceAction::new("turn_on").with_order(1),
            ],
        };
        let ordered = control.ordered_actions();
        assert_eq!(ordered[0].action, "turn_on");
        assert_eq!(ordered[1].action, "temp_24");
    }

    #[test]
    fn test_user_response_parsing() {
        assert_eq!("YES".parse::<UserResponse>().unwrap(), UserResponse::Yes);
        assert_eq!("no".parse::<UserResponse>().unwrap(), UserResponse::No);
        assert!("maybe".parse::<UserResponse>().is_err());
    }

    #[test]
    fn test_preference_patch_merge() {
        let mut profile = PreferenceProfile::default_for("user1");
        assert_eq!(profile.temperature_preference, 24);

        let patch = PreferencePatch {
            temperature_preference: Some(22),
            ..Default::default()
        };
        patch.apply_to(&mut profile);
        assert_eq!(profile.temperature_preference, 22);
        assert_eq!(profile.brightness_preference, 70);
    }

    #[test]
    fn test_recommendation_roundtrip() {
        let rec = Recommendation::new(
            "user1",
            "Turn on the AC?",
            "It is hot outside.",
            Some(DeviceControl::single(
                "air_conditioner",
                Some("ac_1".to_string()),
                "turn_on",
            )),
            Mode::Production,
            TimePeriod::Afternoon,
        );
        let json = serde_json::to_string(&rec).unwrap();
        let back: Recommendation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rec.id);
        assert_eq!(back.status, RecommendationStatus::Pending);
        assert!(back.confirmed_at.is_none());
    }
}
