//! Store photo uploads.
//!
//! Accepts an image from a multipart form, resizes it to a fixed width
//! (preserving aspect ratio), and writes it under the configured upload
//! directory with a fresh uuid filename. Decoding and resizing are
//! CPU-bound and run on the blocking thread pool.

use std::path::{Path, PathBuf};

use image::GenericImageView;
use image::imageops::FilterType;
use thiserror::Error;
use uuid::Uuid;

/// Uploaded photos are scaled down to this width in pixels.
pub const RESIZE_WIDTH: u32 = 800;

/// Errors from the photo upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The uploaded file is not an image type we accept.
    #[error("That file type isn't allowed!")]
    NotAnImage,

    /// The bytes could not be decoded as an image.
    #[error("That file type isn't allowed!")]
    Decode(#[from] image::ImageError),

    /// Writing the resized file failed.
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking resize task panicked or was cancelled.
    #[error("resize task failed")]
    Task,
}

impl UploadError {
    /// Whether the failure is the client's fault (bad file) rather than
    /// ours.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotAnImage | Self::Decode(_))
    }
}

/// Whether a multipart content type is an acceptable photo.
#[must_use]
pub fn is_photo(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// File extension for an accepted image content type.
///
/// Only formats we can both decode and encode are allowed.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpeg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Height that keeps the aspect ratio when scaling to `target_width`.
#[must_use]
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height;
    }
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Resize, then write an uploaded photo; returns the stored filename.
///
/// Images already narrower than [`RESIZE_WIDTH`] are stored as-is.
///
/// # Errors
///
/// Returns [`UploadError::NotAnImage`] for unacceptable content types,
/// [`UploadError::Decode`] for undecodable bytes, and
/// [`UploadError::Io`] when the file cannot be written.
pub async fn save_photo(
    upload_dir: &Path,
    content_type: &str,
    data: Vec<u8>,
) -> Result<String, UploadError> {
    if !is_photo(content_type) {
        return Err(UploadError::NotAnImage);
    }
    let extension = extension_for(content_type).ok_or(UploadError::NotAnImage)?;

    let filename = format!("{}.{extension}", Uuid::new_v4());
    let path: PathBuf = upload_dir.join(&filename);

    tokio::fs::create_dir_all(upload_dir).await?;

    tokio::task::spawn_blocking(move || -> Result<(), UploadError> {
        let img = image::load_from_memory(&data)?;

        let resized = if img.width() > RESIZE_WIDTH {
            let height = scaled_height(img.width(), img.height(), RESIZE_WIDTH);
            img.resize_exact(RESIZE_WIDTH, height, FilterType::Triangle)
        } else {
            img
        };

        resized.save(&path)?;
        Ok(())
    })
    .await
    .map_err(|_| UploadError::Task)??;

    Ok(filename)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_photo() {
        assert!(is_photo("image/jpeg"));
        assert!(is_photo("image/png"));
        assert!(!is_photo("application/pdf"));
        assert!(!is_photo("text/html"));
    }

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/tiff"), None);
    }

    #[test]
    fn test_scaled_height_preserves_aspect() {
        assert_eq!(scaled_height(1600, 1200, 800), 600);
        assert_eq!(scaled_height(800, 800, 800), 800);
        // Extreme panoramas never collapse to zero height
        assert_eq!(scaled_height(100_000, 10, 800), 1);
    }

    #[tokio::test]
    async fn test_save_photo_rejects_non_image() {
        let dir = std::env::temp_dir();
        let err = save_photo(&dir, "application/pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_save_photo_rejects_garbage_bytes() {
        let dir = std::env::temp_dir();
        let err = save_photo(&dir, "image/png", vec![0; 16]).await.unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
        assert!(err.is_client_error());
    }
}
