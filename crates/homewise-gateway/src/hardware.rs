//! Hardware delivery channel client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use homewise_core::collaborators::HardwareChannel;
use homewise_core::config::{defaults, endpoints};
use homewise_core::error::Result as CoreResult;
use homewise_core::types::RecommendationId;

use crate::error::GatewayError;

#[derive(Serialize)]
struct PushRequest<'a> {
    recommendation_id: String,
    title: &'a str,
    contents: &'a str,
}

/// HTTP client that pushes recommendations to the hardware display.
pub struct HardwareClient {
    client: Client,
    endpoint: String,
}

impl HardwareClient {
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
        let endpoint = std::env::var(homewise_core::config::env_vars::HARDWARE_ENDPOINT)
            .unwrap_or_else(|_| endpoints::HARDWARE.to_string());
        Self::new(endpoint)
    }
}

#[async_trait]
impl HardwareChannel for HardwareClient {
    async fn push_recommendation(
        &self,
        id: &RecommendationId,
        title: &str,
        contents: &str,
    ) -> CoreResult<()> {
        let url = format!("{}/api/recommendations", self.endpoint);
        tracing::info!(recommendation_id = %id, "pushing recommendation to hardware");

        let request = PushRequest {
            recommendation_id: id.to_string(),
            title,
            contents,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::from)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body }.into());
        }
        Ok(())
    }
}
