//! Environmental context assembly for the decision engine.
//!
//! Weather and device failures degrade instead of failing the cycle: a
//! recommendation produced without weather is still useful, one produced
//! without knowing the user's devices is not, so inventory errors propagate.

use std::sync::Arc;

use chrono::{Datelike, Local, Timelike, Utc};

use homewise_core::collaborators::{DeviceInventory, WeatherProvider};
use homewise_core::types::{DeviceDescriptor, Season, TimePeriod};

use crate::error::Result;

/// Summary used when the weather service cannot be reached.
pub const WEATHER_UNAVAILABLE: &str = "weather unavailable";

/// Everything the decision engine knows about the user's surroundings at the
/// moment a cycle runs.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub hour: u32,
    pub time_period: TimePeriod,
    pub weekday: String,
    pub season: Season,
    pub weather_summary: String,
    pub weather_details: serde_json::Value,
    pub devices: Vec<DeviceDescriptor>,
}

impl EnvironmentContext {
    /// Whether any device in the inventory can currently be controlled.
    pub fn has_controllable_device(&self) -> bool {
        self.devices.iter().any(|d| d.can_control)
    }

    /// Controllable devices only.
    pub fn controllable_devices(&self) -> Vec<&DeviceDescriptor> {
        self.devices.iter().filter(|d| d.can_control).collect()
    }
}

/// Collects time, weather, and device state into one context bundle.
pub struct ContextCollector {
    weather: Arc<dyn WeatherProvider>,
    inventory: Arc<dyn DeviceInventory>,
}

impl ContextCollector {
    pub fn new(weather: Arc<dyn WeatherProvider>, inventory: Arc<dyn DeviceInventory>) -> Self {
        Self { weather, inventory }
    }

    /// Assemble the context for one user.
    ///
    /// Weather errors degrade to a sentinel summary; inventory errors are
    /// returned to the caller so the per-user cycle is counted as failed.
    pub async fn collect(&self, user_id: &str) -> Result<EnvironmentContext> {
        let now = Local::now();
        let hour = now.hour();
        let time_period = TimePeriod::from_hour(hour);
        let season = Season::from_month(Utc::now().month());
        let weekday = now.format("%A").to_string();

        let weather_summary = match self.weather.summary().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "weather summary unavailable, degrading");
                WEATHER_UNAVAILABLE.to_string()
            }
        };
        let weather_details = match self.weather.details().await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(error = %e, "weather details unavailable, degrading");
                serde_json::Value::Object(serde_json::Map::new())
            }
        };

        let devices = self.inventory.list_devices(user_id).await?;
        tracing::debug!(
            user_id,
            device_count = devices.len(),
            period = %time_period,
            "environment context collected"
        );

        Ok(EnvironmentContext {
            hour,
            time_period,
            weekday,
            season,
            weather_summary,
            weather_details,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use homewise_core::error::{Error, Result as CoreResult};

    struct BrokenWeather;

    #[async_trait]
    impl WeatherProvider for BrokenWeather {
        async fn summary(&self) -> CoreResult<String> {
            Err(Error::Gateway("connection refused".into()))
        }
        async fn details(&self) -> CoreResult<serde_json::Value> {
            Err(Error::Gateway("connection refused".into()))
        }
    }

    struct StaticInventory(Vec<DeviceDescriptor>);

    #[async_trait]
    impl DeviceInventory for StaticInventory {
        async fn list_devices(&self, _user_id: &str) -> CoreResult<Vec<DeviceDescriptor>> {
            Ok(self.0.clone())
        }
        async fn device_state(&self, _device_id: &str) -> CoreResult<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    struct BrokenInventory;

    #[async_trait]
    impl DeviceInventory for BrokenInventory {
        async fn list_devices(&self, _user_id: &str) -> CoreResult<Vec<DeviceDescriptor>> {
            Err(Error::Gateway("gateway down".into()))
        }
        async fn device_state(&self, _device_id: &str) -> CoreResult<serde_json::Value> {
            Err(Error::Gateway("gateway down".into()))
        }
    }

    fn device(id: &str, can_control: bool) -> DeviceDescriptor {
        DeviceDescriptor {
            device_id: id.to_string(),
            device_type: "air_conditioner".to_string(),
            device_name: format!("{id} name"),
            display_name: None,
            capabilities: vec!["turn_on".to_string()],
            current_state: serde_json::json!({"power": "off"}),
            can_control,
        }
    }

    #[tokio::test]
    async fn test_weather_failure_degrades() {
        let collector = ContextCollector::new(
            Arc::new(BrokenWeather),
            Arc::new(StaticInventory(vec![device("ac_1", true)])),
        );
        let ctx = collector.collect("user1").await.unwrap();
        assert_eq!(ctx.weather_summary, WEATHER_UNAVAILABLE);
        assert!(ctx.has_controllable_device());
    }

    #[tokio::test]
    async fn test_inventory_failure_propagates() {
        let collector =
            ContextCollector::new(Arc::new(BrokenWeather), Arc::new(BrokenInventory));
        assert!(collector.collect("user1").await.is_err());
    }

    #[tokio::test]
    async fn test_no_controllable_devices() {
        let collector = ContextCollector::new(
            Arc::new(BrokenWeather),
            Arc::new(StaticInventory(vec![device("sensor_1", false)])),
        );
        let ctx = collector.collect("user1").await.unwrap();
        assert!(!ctx.has_controllable_device());
    }
}
