//! Collaborator traits for external services.
//!
//! The engine consumes these through trait objects so that HTTP clients,
//! simulators, and test fakes are interchangeable. All calls are fallible;
//! how a failure is handled (degrade, retry, surface) is decided at the call
//! site, not here.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DeviceAction, DeviceDescriptor, RecommendationId};

/// Weather information source.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Short human-readable weather summary for prompt injection.
    async fn summary(&self) -> Result<String>;

    /// Structured weather details.
    async fn details(&self) -> Result<serde_json::Value>;
}

/// Device inventory and state source (the device gateway).
#[async_trait]
pub trait DeviceInventory: Send + Sync {
    /// List the devices registered to a user.
    async fn list_devices(&self, user_id: &str) -> Result<Vec<DeviceDescriptor>>;

    /// Current state snapshot of one device.
    async fn device_state(&self, device_id: &str) -> Result<serde_json::Value>;
}

/// Executes device commands. Called only after a user confirms.
#[async_trait]
pub trait DeviceExecutor: Send + Sync {
    async fn execute(&self, device_id: &str, action: &DeviceAction) -> Result<()>;
}

/// Push channel to the user-facing hardware. Fire-and-forget: the YES/NO
/// answer arrives later through a separate inbound call.
#[async_trait]
pub trait HardwareChannel: Send + Sync {
    async fn push_recommendation(
        &self,
        id: &RecommendationId,
        title: &str,
        contents: &str,
    ) -> Result<()>;
}

/// Source of the active-user list for scheduled cycles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn active_users(&self) -> Result<Vec<String>>;
}
