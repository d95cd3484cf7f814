//! Device gateway client: inventory, state, and command execution.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use homewise_core::collaborators::{DeviceExecutor, DeviceInventory};
use homewise_core::config::{defaults, endpoints};
use homewise_core::error::Result as CoreResult;
use homewise_core::types::{DeviceAction, DeviceDescriptor};

use crate::error::GatewayError;

/// Map gateway vendor device types to the engine's canonical snake_case
/// types (e.g. "DEVICE_AIR_CONDITIONER" -> "air_conditioner").
fn canonical_device_type(raw: &str) -> String {
    match raw {
        "DEVICE_AIR_CONDITIONER" => "air_conditioner".to_string(),
        "DEVICE_AIR_PURIFIER" => "air_purifier".to_string(),
        "DEVICE_WASHER" => "washer".to_string(),
        "DEVICE_DRYER" => "dryer".to_string(),
        other => other.to_ascii_lowercase(),
    }
}

#[derive(Deserialize)]
struct GatewayDevice {
    device_id: String,
    device_type: String,
    device_name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    current_state: serde_json::Value,
    #[serde(default)]
    can_control: bool,
}

#[derive(Deserialize)]
struct DeviceListResponse {
    devices: Vec<GatewayDevice>,
}

#[derive(Serialize)]
struct ControlRequest<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// HTTP client for the device gateway.
pub struct DeviceGatewayClient {
    client: Client,
    endpoint: String,
}

impl DeviceGatewayClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn with_default_endpoint() -> Result<Self, GatewayError> {
        let endpoint = std::env::var(homewise_core::config::env_vars::GATEWAY_ENDPOINT)
            .unwrap_or_else(|_| endpoints::DEVICE_GATEWAY.to_string());
        Self::new(endpoint)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Status { status, body })
        }
    }
}

#[async_trait]
impl DeviceInventory for DeviceGatewayClient {
    async fn list_devices(&self, user_id: &str) -> CoreResult<Vec<DeviceDescriptor>> {
        let url = format!("{}/api/devices", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(GatewayError::from)?;
        let response = Self::check(response).await?;
        let list: DeviceListResponse = response.json().await.map_err(GatewayError::from)?;

        Ok(list
            .devices
            .into_iter()
            .map(|d| DeviceDescriptor {
                device_type: canonical_device_type(&d.device_type),
                device_id: d.device_id,
                device_name: d.device_name,
                display_name: d.display_name,
                capabilities: d.capabilities,
                current_state: d.current_state,
                can_control: d.can_control,
            })
            .collect())
    }

    async fn device_state(&self, device_id: &str) -> CoreResult<serde_json::Value> {
        let url = format!("{}/api/devices/{}/state", self.endpoint, device_id);
        let response = self.client.get(&url).send().await.map_err(GatewayError::from)?;
        let response = Self::check(response).await?;
        let state = response.json().await.map_err(GatewayError::from)?;
        Ok(state)
    }
}

#[async_trait]
impl DeviceExecutor for DeviceGatewayClient {
    async fn execute(&self, device_id: &str, action: &DeviceAction) -> CoreResult<()> {
        let url = format!("{}/api/devices/{}/control", self.endpoint, device_id);
        tracing::info!(device_id, action = %action.action, "executing device command");

        let request = ControlRequest {
            command: &action.action,
            description: action.description.as_deref(),
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::from)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_device_type() {
        assert_eq!(
            canonical_device_type("DEVICE_AIR_CONDITIONER"),
            "air_conditioner"
        );
        assert_eq!(canonical_device_type("DEVICE_DRYER"), "dryer");
        assert_eq!(canonical_device_type("DEVICE_LIGHT"), "device_light");
    }
}
