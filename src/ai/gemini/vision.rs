use super::discovery::{bare_model_id, capable_models, select_model};
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData,
    ListModelsResponse, Part,
};
use crate::ai::http::{classify_status, error_message, send};
use crate::ai::{VisionProvider, VisionRequest};
use crate::error::BlockReason;
use crate::image::ImagePayload;
use crate::models::{AiProvider, ApiKey, DescriptionOptions, DEFAULT_GEMINI_MODEL};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Token budget for the `auto` detail tier.
pub const AUTO_DETAIL_TOKENS: u32 = 500;
pub const TEMPERATURE: f64 = 0.4;

/// Gemini `generateContent` vision requests.
///
/// The model is discovered on first use and kept for the lifetime of the
/// provider. A later `NotFound` does not trigger rediscovery; only
/// [`VisionProvider::probe`] re-runs it.
pub struct GeminiVisionProvider {
    client: Client,
    api_key: ApiKey,
    preferred_model: String,
    base_url: String,
    resolved_model: Mutex<Option<String>>,
}

impl GeminiVisionProvider {
    pub fn new(api_key: ApiKey) -> Self {
        Self::new_with_client(api_key, DEFAULT_GEMINI_MODEL.to_string(), Client::new())
    }

    /// `preferred_model` may be a bare ID or a `models/...` path.
    pub fn new_with_client(api_key: ApiKey, preferred_model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            preferred_model: bare_model_id(&preferred_model).to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            resolved_model: Mutex::new(None),
        }
    }

    /// Point the provider at a different API host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Model chosen by discovery, if it has run successfully.
    pub fn resolved_model(&self) -> Option<String> {
        self.resolved_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Model the next request will target.
    pub fn model(&self) -> String {
        self.resolved_model()
            .unwrap_or_else(|| self.preferred_model.clone())
    }

    fn set_resolved_model(&self, model: String) {
        *self
            .resolved_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    fn classify(&self, status: StatusCode, body: &str) -> Error {
        if status == StatusCode::BAD_REQUEST && is_invalid_key(body) {
            return Error::Auth(format!(
                "Gemini API key is invalid or lacks Generative AI API access: {}",
                error_message(body)
            ));
        }
        classify_status(status, body, &format!("model '{}'", self.model()))
    }

    async fn discover_model(&self) -> Result<String> {
        tracing::info!("Detecting available Gemini model");

        let request = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .timeout(DISCOVERY_TIMEOUT)
            .header("x-goog-api-key", self.api_key.expose());

        let (status, body) = send("Gemini", request).await?;
        if !status.is_success() {
            return Err(self.classify(status, &body));
        }

        let listing: ListModelsResponse = serde_json::from_str(&body).map_err(|e| {
            Error::MalformedResponse(format!("Failed to parse Gemini model list: {}", e))
        })?;

        let available = capable_models(&listing);
        tracing::debug!("Gemini models supporting generateContent: {:?}", available);

        let model = select_model(&available, &self.preferred_model).ok_or_else(|| {
            Error::NoCompatibleModel(
                "no Gemini model supports generateContent for this API key".to_string(),
            )
        })?;

        tracing::info!("Using Gemini model: {}", model);
        Ok(model)
    }
}

fn is_invalid_key(body: &str) -> bool {
    body.contains("API_KEY_INVALID") || error_message(body).contains("API key not valid")
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    fn provider(&self) -> AiProvider {
        AiProvider::Gemini
    }

    async fn prepare(&self) -> Result<()> {
        if self.resolved_model().is_some() {
            return Ok(());
        }
        let model = self.discover_model().await?;
        self.set_resolved_model(model);
        Ok(())
    }

    fn build(&self, image: &ImagePayload, options: &DescriptionOptions) -> Result<VisionRequest> {
        let prompt = prompts::instruction(options.detail, options.language);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.base64().to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: options
                    .detail
                    .token_budget(options.max_tokens, AUTO_DETAIL_TOKENS),
                temperature: TEMPERATURE,
            },
        };

        Ok(VisionRequest {
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url,
                self.model()
            ),
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("x-goog-api-key", self.api_key.expose().to_string()),
            ],
            body: serde_json::to_value(&request)?,
        })
    }

    fn parse(&self, status: StatusCode, body: &str) -> Result<String> {
        if !status.is_success() {
            return Err(self.classify(status, body));
        }

        let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            Error::MalformedResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let Some(candidate) = response.candidates.first() else {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(Error::SafetyBlocked(BlockReason::Prompt(reason)));
            }
            return Err(Error::MalformedResponse(
                "No candidates in Gemini response".to_string(),
            ));
        };

        let finish_reason = candidate.finish_reason.as_deref();
        tracing::debug!("Gemini finish reason: {:?}", finish_reason);

        match finish_reason {
            Some("SAFETY") => return Err(Error::SafetyBlocked(BlockReason::Safety)),
            Some("RECITATION") => return Err(Error::SafetyBlocked(BlockReason::Recitation)),
            _ => {}
        }

        match candidate.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ if finish_reason == Some("MAX_TOKENS") => Err(Error::TruncatedNoContent),
            _ => Err(Error::MalformedResponse(
                "No text content in Gemini response".to_string(),
            )),
        }
    }

    /// Re-runs discovery, replacing any previously resolved model.
    async fn probe(&self) -> Result<()> {
        let model = self.discover_model().await?;
        self.set_resolved_model(model);
        Ok(())
    }
}
