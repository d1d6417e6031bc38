//! HTTP handlers
//!
//! `/identify` runs the upload → PlantNet → normalize pipeline. The remaining routes are
//! operator diagnostics and never touch that pipeline.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ApiResult, ConfigError, UpstreamError, ValidationError};
use crate::model::{self, IdentificationResult, Source};
use crate::upload::accept_upload;
use crate::AppState;

const API_KEY_PREFIX_LEN: usize = 8;

#[derive(Debug, Serialize)]
pub struct IdentifyReply {
    pub success: bool,
    pub result: IdentificationResult,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// POST /identify
pub async fn identify(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<IdentifyReply>> {
    let multipart = multipart.map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let image = accept_upload(multipart).await?;

    let Some(api_key) = state.config.api_key() else {
        tracing::error!("PlantNet API key not configured, rejecting identification");
        return Err(ConfigError::MissingCredential.into());
    };

    let uploaded_bytes = image.len();
    let outcome = state.client.identify(api_key, image).await;
    let identification = model::normalize(outcome, uploaded_bytes);

    Ok(Json(IdentifyReply {
        success: true,
        note: identification.note(),
        source: identification.source,
        result: identification.result,
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Plant identification relay is running",
        "timestamp": Utc::now().to_rfc3339(),
        "hasApiKey": state.config.has_api_key(),
    }))
}

/// GET /test-api
///
/// Exposes the first characters of the credential. Operator use only.
pub async fn test_api(State(state): State<Arc<AppState>>) -> Json<Value> {
    let api_key = state.config.api_key();

    Json(json!({
        "hasApiKey": api_key.is_some(),
        "apiKeyLength": api_key.map(str::len).unwrap_or(0),
        "apiKeyPrefix": api_key.map(|key| {
            let prefix: String = key.chars().take(API_KEY_PREFIX_LEN).collect();
            format!("{prefix}...")
        }),
    }))
}

/// GET /test-plantnet
pub async fn test_plantnet(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let Some(api_key) = state.config.api_key() else {
        return Err(ConfigError::MissingCredential.into());
    };

    let body = match state.client.probe(api_key).await {
        Ok(probe) => json!({
            "success": true,
            "status": probe.status,
            "data": probe.data,
        }),
        Err(UpstreamError::HttpStatus(status, details)) => {
            tracing::warn!(status, "PlantNet probe rejected");
            let details = serde_json::from_str::<Value>(&details).unwrap_or(Value::String(details));
            json!({
                "success": false,
                "error": format!("PlantNet returned HTTP {status}"),
                "status": status,
                "details": details,
            })
        }
        Err(err) => {
            tracing::warn!(error = %err, "PlantNet probe failed");
            json!({
                "success": false,
                "error": err.to_string(),
            })
        }
    };

    Ok(Json(body))
}
