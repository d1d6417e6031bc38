//! Pl@ntNet identification client
//!
//! One multipart POST per identification, no retries. The credential travels in the
//! `api-key` query parameter as the service requires.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::upload::UploadedImage;

pub const PLANTNET_IDENTIFY_URL: &str = "https://my-api.plantnet.org/v2/identify/all";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const IMAGES_FIELD: &str = "images";
const ORGANS_FIELD: &str = "organs";
const ORGANS_AUTO: &str = "auto";
const FIXED_QUERY: [(&str, &str); 3] = [
    ("include-related-images", "true"),
    ("no-reject", "false"),
    ("lang", "en"),
];

/// 1x1 PNG sent by the connectivity probe.
pub const PROBE_IMAGE_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
pub const PROBE_FILENAME: &str = "test.jpg";
pub const PROBE_CONTENT_TYPE: &str = "image/jpeg";

/// Identification response. Fields the relay never reads are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    #[serde(default)]
    pub best_match: Option<String>,
    #[serde(default)]
    pub results: Vec<IdentificationCandidate>,
}

/// One ranked match, best first.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentificationCandidate {
    pub score: f64,
    pub species: Species,
    #[serde(default)]
    pub images: Vec<CandidateImage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    #[serde(rename = "scientificNameWithoutAuthor")]
    pub scientific_name: String,
    #[serde(default)]
    pub common_names: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidateImage {
    pub url: ImageUrls,
}

/// Original, medium and small renditions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub o: Option<String>,
    #[serde(default)]
    pub m: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
}

/// Raw outcome of the connectivity probe.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct PlantNetClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl PlantNetClient {
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_endpoint(PLANTNET_IDENTIFY_URL, REQUEST_TIMEOUT)
    }

    /// Client bound to an explicit endpoint and timeout.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    /// Submits one image for identification.
    pub async fn identify(
        &self,
        api_key: &str,
        image: UploadedImage,
    ) -> Result<IdentifyResponse, UpstreamError> {
        tracing::debug!(
            filename = %image.filename,
            content_type = %image.content_type,
            size = image.len(),
            "Querying PlantNet"
        );

        let response = self
            .send(api_key, image.bytes, &image.filename, &image.content_type)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::HttpStatus(status.as_u16(), error_text));
        }

        let parsed: IdentifyResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(top) = parsed.results.first() {
            tracing::info!(
                species = %top.species.scientific_name,
                best_match = parsed.best_match.as_deref().unwrap_or_default(),
                score = top.score,
                matches = parsed.results.len(),
                "PlantNet identification successful"
            );
        }

        Ok(parsed)
    }

    /// Sends the embedded test image and reports whatever comes back.
    pub async fn probe(&self, api_key: &str) -> Result<ProbeResponse, UpstreamError> {
        let bytes = STANDARD
            .decode(PROBE_IMAGE_BASE64)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let response = self
            .send(api_key, Bytes::from(bytes), PROBE_FILENAME, PROBE_CONTENT_TYPE)
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let data = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        if !status.is_success() {
            return Err(UpstreamError::HttpStatus(status.as_u16(), data.to_string()));
        }

        Ok(ProbeResponse {
            status: status.as_u16(),
            data,
        })
    }

    async fn send(
        &self,
        api_key: &str,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<reqwest::Response, UpstreamError> {
        let length = bytes.len() as u64;
        let part = Part::stream_with_length(bytes, length)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let form = Form::new()
            .part(IMAGES_FIELD, part)
            .text(ORGANS_FIELD, ORGANS_AUTO);

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("api-key", api_key)])
            .query(&FIXED_QUERY)
            .multipart(form)
            .send()
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_image_decodes_to_png() {
        let bytes = STANDARD.decode(PROBE_IMAGE_BASE64).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn identify_response_parses_plantnet_shape() {
        let body = r#"{
            "query": {"project": "all", "organs": ["auto"]},
            "language": "en",
            "bestMatch": "Ficus elastica Roxb. ex Hornem.",
            "results": [{
                "score": 0.8731,
                "species": {
                    "scientificNameWithoutAuthor": "Ficus elastica",
                    "scientificNameAuthorship": "Roxb. ex Hornem.",
                    "scientificName": "Ficus elastica Roxb. ex Hornem.",
                    "commonNames": ["Rubber plant", "Rubber fig"]
                },
                "images": [{"url": {"o": "https://x/o.jpg", "m": "https://x/m.jpg", "s": "https://x/s.jpg"}}]
            }],
            "remainingIdentificationRequests": 498
        }"#;

        let parsed: IdentifyResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        let top = &parsed.results[0];
        assert_eq!(top.species.scientific_name, "Ficus elastica");
        assert_eq!(top.species.common_names[0], "Rubber plant");
        assert_eq!(top.images[0].url.m.as_deref(), Some("https://x/m.jpg"));
        assert!(top.species.description.is_none());
        assert_eq!(
            parsed.best_match.as_deref(),
            Some("Ficus elastica Roxb. ex Hornem.")
        );
    }

    #[test]
    fn best_match_is_optional() {
        let parsed: IdentifyResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(parsed.best_match.is_none());
        assert!(parsed.results.is_empty());
    }
}
