// src/common/images.rs
//! Shared image handling
//!
//! Recipe images and avatars arrive either as base64 data URIs inside JSON
//! payloads or as raw multipart bytes. Both paths go through the same
//! sniff-and-validate step before anything touches disk.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use infer::Infer;
use std::path::Path;
use tokio::fs as tokio_fs;
use tracing::error;

use super::error::ApiError;

/// File size limit: 5MB
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// A decoded, validated image ready to be written to disk
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub extension: &'static str,
}

/// Decode a base64 image payload
///
/// Accepts both `data:image/png;base64,AAAA...` data URIs and bare base64
/// strings. The decoded bytes are content-sniffed; the declared mime type in
/// the URI header is ignored.
pub fn decode_base64_image(input: &str) -> Result<DecodedImage, ApiError> {
    let encoded = if input.starts_with("data:") {
        input
            .split(',')
            .nth(1)
            .ok_or_else(|| ApiError::BadRequest("Invalid base64 image data".to_string()))?
    } else {
        input
    };

    let data = BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("Invalid base64 image data".to_string()))?;

    if data.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::BadRequest(
            "Image size exceeds 5MB limit".to_string(),
        ));
    }

    let extension = image_extension(&data).ok_or_else(|| {
        ApiError::BadRequest(
            "Invalid image type. Only JPEG, PNG, GIF, and WebP are supported".to_string(),
        )
    })?;

    Ok(DecodedImage { data, extension })
}

/// Validate raw image bytes (multipart uploads)
pub fn is_valid_image_type(data: &[u8]) -> bool {
    image_extension(data).is_some()
}

/// Sniff the image type and return its canonical extension
pub fn image_extension(data: &[u8]) -> Option<&'static str> {
    let infer = Infer::new();
    let info = infer.get(data)?;
    match info.mime_type() {
        "image/jpeg" | "image/jpg" | "image/png" | "image/gif" | "image/webp" => {
            Some(info.extension())
        }
        _ => None,
    }
}

/// Content type for serving a stored image by filename
pub fn content_type_from_extension(filename: &str) -> &'static str {
    match filename.split('.').last() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/jpeg",
    }
}

/// Write image bytes under the given media directory
pub async fn save_image(dir: &Path, filename: &str, data: &[u8]) -> Result<(), ApiError> {
    let file_path = dir.join(filename);

    tokio_fs::write(&file_path, data).await.map_err(|e| {
        error!(error = %e, file_path = %file_path.display(), "Failed to save image file");
        ApiError::InternalServer("Failed to save image file".to_string())
    })?;

    Ok(())
}

/// Delete a stored image, ignoring files that are already gone
pub async fn delete_image(dir: &Path, filename: &str) {
    let file_path = dir.join(sanitize_filename(filename));
    if file_path.exists() {
        let _ = tokio_fs::remove_file(&file_path).await;
    }
}

pub fn sanitize_filename(filename: &str) -> String {
    // Remove path traversal sequences and directory separators
    let cleaned = filename
        .replace("..", "")
        .replace("/", "")
        .replace("\\", "")
        .replace("\0", ""); // Remove null bytes

    // Whitelist safe characters: alphanumeric, dots, hyphens, underscores
    let sanitized: String = cleaned
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect();

    // Limit filename length to prevent buffer overflow attacks
    let max_length = 255;
    let truncated = if sanitized.len() > max_length {
        sanitized.chars().take(max_length).collect()
    } else {
        sanitized
    };

    // Ensure we don't end up with an empty filename
    if truncated.is_empty() {
        "sanitized_file".to_string()
    } else {
        truncated
    }
}
