//! Multipart upload acceptance
//!
//! Pulls the `image` field out of the form and applies the type and size filter. Clients
//! that send images as `application/octet-stream` are accepted when the filename has a
//! known image extension; the real content type is then inferred from that extension.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use image::ImageFormat;

use crate::error::ValidationError;

pub const IMAGE_FIELD: &str = "image";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const GENERIC_BINARY: &str = "application/octet-stream";

/// An accepted upload, held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}

impl UploadedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reads the multipart form and returns the validated image.
///
/// The type is checked from the part headers before any payload is buffered, and reading
/// stops as soon as the payload passes [`MAX_UPLOAD_BYTES`].
pub async fn accept_upload(mut multipart: Multipart) -> Result<UploadedImage, ValidationError> {
    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = resolve_content_type(field.content_type(), &filename)?;
        let bytes = read_capped(&mut field, MAX_UPLOAD_BYTES).await?;

        return accepted(bytes, content_type, filename);
    }

    Err(ValidationError::MissingFile)
}

/// Applies the type and size checks to an already extracted file.
pub fn validate(
    bytes: impl Into<Bytes>,
    content_type: Option<&str>,
    filename: String,
) -> Result<UploadedImage, ValidationError> {
    let bytes = bytes.into();
    let content_type = resolve_content_type(content_type, &filename)?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            limit: MAX_UPLOAD_BYTES,
        });
    }

    accepted(bytes, content_type, filename)
}

fn accepted(
    bytes: Bytes,
    content_type: String,
    filename: String,
) -> Result<UploadedImage, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::MissingFile);
    }

    tracing::debug!(
        filename = %filename,
        content_type = %content_type,
        size = bytes.len(),
        "Upload accepted"
    );

    Ok(UploadedImage {
        bytes,
        content_type,
        filename,
    })
}

async fn read_capped(field: &mut Field<'_>, limit: usize) -> Result<Bytes, ValidationError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field.chunk().await.map_err(read_error)? {
        if buffer.len() + chunk.len() > limit {
            return Err(ValidationError::TooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

/// A body that overruns the router limit surfaces as a 413 multipart error.
fn read_error(err: MultipartError) -> ValidationError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::TooLarge {
            limit: MAX_UPLOAD_BYTES,
        }
    } else {
        ValidationError::Malformed(err.body_text())
    }
}

/// Returns the content type to forward upstream, or rejects the upload.
pub fn resolve_content_type(
    declared: Option<&str>,
    filename: &str,
) -> Result<String, ValidationError> {
    let declared = declared.unwrap_or(GENERIC_BINARY);
    let mime = declared
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or(declared)
        .to_ascii_lowercase();

    if mime.starts_with("image/") {
        return Ok(mime);
    }

    if mime == GENERIC_BINARY {
        if let Some(inferred) = mime_from_extension(filename) {
            return Ok(inferred.to_string());
        }
    }

    Err(ValidationError::UnsupportedType(declared.to_string()))
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let (_, extension) = filename.rsplit_once('.')?;
    ImageFormat::from_extension(extension).map(|format| format.to_mime_type())
}
