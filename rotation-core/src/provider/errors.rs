// =================================================================
// provider/errors.rs - Error Types
// =================================================================

use rotation_common::DataError;
use thiserror::Error;

/// Error types for market data providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl ProviderError {
    /// Whether retrying the same request later can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProviderError::NetworkError(_) | ProviderError::RateLimit(_) | ProviderError::Timeout
        )
    }
}

// Convert from common error types
impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::NetworkError(err.to_string())
        } else {
            ProviderError::ApiError(err.to_string())
        }
    }
}
