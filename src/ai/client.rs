use super::{DescriptionService, GeminiVisionProvider, OpenAiVisionProvider, VisionProvider};
use crate::ai::http::send;
use crate::image::ImagePayload;
use crate::models::{AiProvider, Config, DescriptionOptions};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs description requests for exactly one vendor and one credential.
pub struct ProviderClient {
    provider: Box<dyn VisionProvider>,
    http: Client,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(provider: Box<dyn VisionProvider>, http: Client) -> Self {
        Self {
            provider,
            http,
            timeout: DESCRIBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> AiProvider {
        self.provider.provider()
    }
}

#[async_trait]
impl DescriptionService for ProviderClient {
    async fn describe_image(
        &self,
        image: &ImagePayload,
        options: &DescriptionOptions,
    ) -> Result<String> {
        let vendor = self.provider();
        self.provider.prepare().await?;

        let request = self.provider.build(image, options)?;
        debug!(
            "Sending {} description request (detail: {}, language: {}): {:?}",
            vendor,
            options.detail.as_str(),
            options.language.as_str(),
            request
        );

        let mut builder = self.http.post(&request.endpoint).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        let builder = builder.body(serde_json::to_vec(&request.body)?);

        let (status, body) = send(vendor.as_str(), builder).await?;
        let description = self.provider.parse(status, &body)?;

        info!("Received description from {}", vendor);
        Ok(description)
    }

    async fn test_connection(&self) -> bool {
        match self.provider.probe().await {
            Ok(()) => {
                info!("{} connection test succeeded", self.provider());
                true
            }
            Err(e) => {
                warn!("{} connection test failed: {}", self.provider(), e);
                false
            }
        }
    }
}

/// Build the client for the provider selected in `config`.
///
/// Pass one shared `reqwest::Client` to reuse its connection pool.
pub fn build_client(config: &Config, http: Client) -> Result<ProviderClient> {
    let api_key = config.api_key()?.clone();

    let provider: Box<dyn VisionProvider> = match config.provider {
        AiProvider::OpenAi => {
            info!("Vision provider: OpenAI (model: {})", config.openai_model);
            Box::new(OpenAiVisionProvider::new_with_client(
                api_key,
                config.openai_model.clone(),
                http.clone(),
            ))
        }
        AiProvider::Gemini => {
            info!(
                "Vision provider: Gemini (preferred model: {})",
                config.gemini_model
            );
            Box::new(GeminiVisionProvider::new_with_client(
                api_key,
                config.gemini_model.clone(),
                http.clone(),
            ))
        }
    };

    Ok(ProviderClient::new(provider, http))
}
