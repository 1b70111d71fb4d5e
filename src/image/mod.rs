//! Image payload construction
//!
//! Turns files, URLs, or raw bytes into the base64 blob the vision providers
//! accept. Large images are downscaled and re-encoded as PNG first.

pub mod loader;

pub use loader::{load_from_file, load_from_url, payload_from_image_bytes, MAX_DIMENSION};

use base64::Engine as _;
use std::fmt;

/// Already-encoded image ready to embed in a provider request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: String,
    mime_type: &'static str,
}

impl ImagePayload {
    /// Wrap base64 text produced elsewhere. The image is assumed to be PNG.
    pub fn from_base64(data: impl Into<String>) -> Self {
        Self::from_base64_with_mime(data, "image/png")
    }

    pub fn from_base64_with_mime(data: impl Into<String>, mime_type: &'static str) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    /// Base64-encode bytes that are already in a transportable image format.
    pub fn from_encoded_bytes(bytes: &[u8]) -> Self {
        let mime_type = crate::ai::mime::detect_image_mime(bytes);
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self { data, mime_type }
    }

    pub fn base64(&self) -> &str {
        &self.data
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("base64_len", &self.data.len())
            .finish()
    }
}
