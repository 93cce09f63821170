//! Core types for the editing session.

use crate::error::{Result, RetouchError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported input image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An uploaded image, encoded once and immutable for the rest of the session.
///
/// The base64 payload and the data URL always describe the same bytes; the
/// URL is what a viewer displays, the payload is what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    base64: String,
    mime_type: String,
    data_url: String,
}

impl SourceImage {
    /// Encodes raw image bytes under the given declared MIME type.
    ///
    /// Anything whose declared type is not in the `image/` category is
    /// rejected with [`RetouchError::InvalidInput`] and no record is created.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(RetouchError::InvalidInput(format!(
                "expected an image file, got '{mime_type}'"
            )));
        }

        let base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let data_url = format!("data:{mime_type};base64,{base64}");
        Ok(Self {
            base64,
            mime_type,
            data_url,
        })
    }

    /// Reads an image file asynchronously and encodes it.
    ///
    /// The format is sniffed from magic bytes, falling back to the file
    /// extension; unrecognized files are rejected without reading further.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;

        let format = ImageFormat::from_magic_bytes(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                RetouchError::InvalidInput(format!(
                    "'{}' is not a recognized image (png, jpg, webp)",
                    path.display()
                ))
            })?;

        Self::from_bytes(&bytes, format.mime_type())
    }

    /// The base64 payload, without the data URL prefix.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// The declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The full `data:<mime>;base64,<payload>` URL for display.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Decodes the payload back into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| RetouchError::Decode(e.to_string()))
    }
}

/// The result of one edit call: an image, a text note from the model, or
/// both. A new outcome supersedes the previous one.
///
/// An outcome with no image is not a valid success; the session turns it
/// into a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Data URL of the generated image, if one was produced.
    pub image_data_url: Option<String>,
    /// Free-text commentary returned alongside (or instead of) the image.
    pub note: Option<String>,
}

impl EditOutcome {
    /// Returns true if the model actually produced an image.
    pub fn has_image(&self) -> bool {
        self.image_data_url.is_some()
    }

    /// Decodes the generated image's bytes from its data URL.
    pub fn image_bytes(&self) -> Result<Vec<u8>> {
        let url = self
            .image_data_url
            .as_deref()
            .ok_or_else(|| RetouchError::EmptyResult("outcome has no image".into()))?;
        let payload = url
            .split_once(";base64,")
            .map(|(_, b64)| b64)
            .ok_or_else(|| RetouchError::Decode("not a base64 data URL".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| RetouchError::Decode(e.to_string()))
    }
}
