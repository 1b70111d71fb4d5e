use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatMessageContent, ImageUrl,
    MessagePart,
};
use crate::ai::http::{classify_status, send};
use crate::ai::{VisionProvider, VisionRequest};
use crate::error::BlockReason;
use crate::image::ImagePayload;
use crate::models::{AiProvider, ApiKey, DescriptionOptions, DEFAULT_OPENAI_MODEL};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Token budget for the `auto` detail tier.
pub const AUTO_DETAIL_TOKENS: u32 = 800;

/// OpenAI chat-completions vision requests.
pub struct OpenAiVisionProvider {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiVisionProvider {
    pub fn new(api_key: ApiKey) -> Self {
        Self::new_with_client(api_key, DEFAULT_OPENAI_MODEL.to_string(), Client::new())
    }

    pub fn new_with_client(api_key: ApiKey, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different API host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose())
    }
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    fn build(&self, image: &ImagePayload, options: &DescriptionOptions) -> Result<VisionRequest> {
        let prompt = prompts::instruction(options.detail, options.language);
        let max_tokens = options
            .detail
            .token_budget(options.max_tokens, AUTO_DETAIL_TOKENS);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(ChatMessageContent::Parts(vec![
                    MessagePart {
                        part_type: "text".to_string(),
                        text: Some(prompt.to_string()),
                        image_url: None,
                    },
                    MessagePart {
                        part_type: "image_url".to_string(),
                        text: None,
                        image_url: Some(ImageUrl {
                            url: image.data_url(),
                            detail: Some(options.detail.as_str().to_string()),
                        }),
                    },
                ])),
            }],
            max_tokens,
        };

        Ok(VisionRequest {
            endpoint: format!("{}/v1/chat/completions", self.base_url),
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("Authorization", self.bearer()),
            ],
            body: serde_json::to_value(&request)?,
        })
    }

    fn parse(&self, status: StatusCode, body: &str) -> Result<String> {
        if !status.is_success() {
            return Err(classify_status(
                status,
                body,
                &format!("model '{}'", self.model),
            ));
        }

        let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            Error::MalformedResponse(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::MalformedResponse("No choices in OpenAI response".to_string()))?;

        match choice.text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => match choice.finish_reason.as_deref() {
                Some("length") => Err(Error::TruncatedNoContent),
                Some("content_filter") => Err(Error::SafetyBlocked(BlockReason::ContentFilter)),
                _ => Err(Error::MalformedResponse(
                    "No text content in OpenAI response".to_string(),
                )),
            },
        }
    }

    async fn probe(&self) -> Result<()> {
        let request = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .header("Authorization", self.bearer());

        let (status, body) = send("OpenAI", request).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(classify_status(status, &body, "models endpoint"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailLevel, Language};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> OpenAiVisionProvider {
        OpenAiVisionProvider::new(ApiKey::new("sk-test"))
    }

    fn image() -> ImagePayload {
        ImagePayload::from_base64("iVBORw0KGgo=")
    }

    #[test]
    fn test_build_request_shape() {
        let options = DescriptionOptions::new(DetailLevel::High, Language::En, 4000);
        let request = provider().build(&image(), &options).unwrap();

        assert_eq!(request.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(
            request.body,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": prompts::instruction(DetailLevel::High, Language::En)
                        },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": "data:image/png;base64,iVBORw0KGgo=",
                                "detail": "high"
                            }
                        }
                    ]
                }],
                "max_tokens": 4000
            })
        );
    }

    #[test]
    fn test_build_token_budget_per_detail() {
        let provider = provider();
        for (detail, expected) in [
            (DetailLevel::Low, 150),
            (DetailLevel::Auto, AUTO_DETAIL_TOKENS),
            (DetailLevel::High, 1234),
        ] {
            for language in Language::ALL {
                let options = DescriptionOptions::new(detail, language, 1234);
                let request = provider.build(&image(), &options).unwrap();

                assert_eq!(request.body["max_tokens"], expected);
                assert_eq!(
                    request.body["messages"][0]["content"][0]["text"],
                    prompts::instruction(detail, language)
                );
                assert_eq!(
                    request.body["messages"][0]["content"][1]["image_url"]["detail"],
                    detail.as_str()
                );
            }
        }
    }

    #[test]
    fn test_build_unknown_language_uses_spanish() {
        let options = DescriptionOptions::new(DetailLevel::Low, Language::from("xx"), 100);
        let request = provider().build(&image(), &options).unwrap();
        assert_eq!(
            request.body["messages"][0]["content"][0]["text"],
            prompts::LOW_ES
        );
    }

    #[test]
    fn test_parse_trims_first_choice() {
        let body = serde_json::json!({
            "choices": [
                {
                    "message": { "role": "assistant", "content": "\n  A red square on white.  \n" },
                    "finish_reason": "stop"
                },
                {
                    "message": { "role": "assistant", "content": "second choice" },
                    "finish_reason": "stop"
                }
            ]
        })
        .to_string();

        let text = provider().parse(StatusCode::OK, &body).unwrap();
        assert_eq!(text, "A red square on white.");
    }

    #[test]
    fn test_parse_401_is_auth_error() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}"#;
        let err = provider().parse(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_parse_400_surfaces_vendor_message() {
        let body = r#"{"error": {"message": "Invalid image data", "type": "invalid_request_error"}}"#;
        let err = provider().parse(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, Error::BadRequest(msg) if msg == "Invalid image data"));
    }

    #[test]
    fn test_parse_429_is_rate_limited() {
        let err = provider()
            .parse(StatusCode::TOO_MANY_REQUESTS, "{}")
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited));
    }

    #[test]
    fn test_parse_404_names_model() {
        let err = provider().parse(StatusCode::NOT_FOUND, "").unwrap_err();
        assert!(matches!(err, Error::NotFound(what) if what.contains("gpt-4o")));
    }

    #[test]
    fn test_parse_length_without_content_is_truncated() {
        let body = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": null },
                "finish_reason": "length"
            }]
        })
        .to_string();

        let err = provider().parse(StatusCode::OK, &body).unwrap_err();
        assert!(matches!(err, Error::TruncatedNoContent));
    }

    #[test]
    fn test_parse_content_filter_is_safety_block() {
        let body = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "" },
                "finish_reason": "content_filter"
            }]
        })
        .to_string();

        let err = provider().parse(StatusCode::OK, &body).unwrap_err();
        assert!(matches!(
            err,
            Error::SafetyBlocked(BlockReason::ContentFilter)
        ));
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        let err = provider()
            .parse(StatusCode::OK, r#"{"choices": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_non_json_body() {
        let err = provider()
            .parse(StatusCode::OK, "<html>proxy page</html>")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_probe_lists_models() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{ "id": "gpt-4o", "object": "model" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider().with_base_url(server.uri());
        provider.probe().await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_rejected_key_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let provider = provider().with_base_url(server.uri());
        let err = provider.probe().await.unwrap_err();
        assert!(matches!(err, Error::Auth(msg) if msg == "Incorrect API key provided"));
    }
}
