//! Vision provider integration
//!
//! Every vendor implements [`VisionProvider`] (request building, response
//! parsing, connectivity probe). [`ProviderClient`] drives one provider over
//! HTTP and is what callers hold, usually behind [`DescriptionService`].

pub mod client;
pub mod gemini;
pub(crate) mod http;
pub mod mime;
pub mod mock;
pub mod openai;

pub use client::{build_client, ProviderClient};
pub use gemini::GeminiVisionProvider;
pub use mock::MockDescriptionClient;
pub use openai::OpenAiVisionProvider;

use crate::image::ImagePayload;
use crate::models::{AiProvider, DescriptionOptions};
use crate::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;

/// A fully built provider call: where to POST, with which headers and body.
pub struct VisionRequest {
    pub endpoint: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

impl VisionRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Header values carry credentials and the body carries the image.
impl fmt::Debug for VisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(name, _)| *name).collect();
        f.debug_struct("VisionRequest")
            .field("endpoint", &self.endpoint)
            .field("headers", &names)
            .finish_non_exhaustive()
    }
}

/// Vendor-specific half of a description call.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn provider(&self) -> AiProvider;

    /// Resolve any lazily discovered state needed by [`VisionProvider::build`].
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn build(&self, image: &ImagePayload, options: &DescriptionOptions) -> Result<VisionRequest>;

    /// Map a raw HTTP status and body to description text or a typed error.
    fn parse(&self, status: StatusCode, body: &str) -> Result<String>;

    /// Cheap authenticated call used to validate a credential.
    async fn probe(&self) -> Result<()>;
}

#[async_trait]
pub trait DescriptionService: Send + Sync {
    async fn describe_image(
        &self,
        image: &ImagePayload,
        options: &DescriptionOptions,
    ) -> Result<String>;

    async fn test_connection(&self) -> bool;
}
