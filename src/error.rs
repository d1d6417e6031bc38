//! Error types for the relay
//!
//! Local failures (validation, configuration) become HTTP errors. Upstream failures never
//! reach the caller; they are absorbed by the placeholder fallback in [`crate::model`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Upload rejected before any upstream work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No image file uploaded")]
    MissingFile,

    #[error("Unsupported file type: {0}. Only image files are allowed")]
    UnsupportedType(String),

    #[error("File too large: uploads are limited to {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to read multipart body: {0}")]
    Malformed(String),
}

/// Process configuration problems detected while serving a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PlantNet API key not configured")]
    MissingCredential,
}

/// Failure of the outbound identification call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("PlantNet request timed out")]
    Timeout,

    #[error("PlantNet returned HTTP {0}: {1}")]
    HttpStatus(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode PlantNet response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::HttpStatus(code, _) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Errors a handler may surface to the caller
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
