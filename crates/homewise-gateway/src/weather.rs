//! Weather service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use homewise_core::collaborators::WeatherProvider;
use homewise_core::config::{defaults, endpoints};
use homewise_core::error::Result as CoreResult;

use crate::error::GatewayError;

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

/// HTTP client for the weather collaborator.
pub struct WeatherClient {
    client: Client,
    endpoint: String,
}

impl WeatherClient {
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
        let endpoint = std::env::var(homewise_core::config::env_vars::WEATHER_ENDPOINT)
            .unwrap_or_else(|_| endpoints::WEATHER.to_string());
        Self::new(endpoint)
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn summary(&self) -> CoreResult<String> {
        let url = format!("{}/weather/summary", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(GatewayError::from)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body }.into());
        }
        let parsed: SummaryResponse = response.json().await.map_err(GatewayError::from)?;
        Ok(parsed.summary)
    }

    async fn details(&self) -> CoreResult<serde_json::Value> {
        let url = format!("{}/weather/details", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(GatewayError::from)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body }.into());
        }
        let details = response.json().await.map_err(GatewayError::from)?;
        Ok(details)
    }
}
