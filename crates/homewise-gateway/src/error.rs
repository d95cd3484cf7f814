//! Error types for the gateway clients.

use thiserror::Error;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from the HTTP collaborators.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote did not answer within the timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Non-success HTTP status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

impl From<GatewayError> for homewise_core::Error {
    fn from(e: GatewayError) -> Self {
        homewise_core::Error::Gateway(e.to_string())
    }
}
