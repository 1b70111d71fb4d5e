//! Status classification shared by both providers.

use crate::{Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;

const BODY_SNIPPET_CHARS: usize = 200;

/// `{"error": {"message": ...}}`, the error envelope both vendors use.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// Vendor error message, or the head of the raw body when it isn't JSON.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| snippet(body))
}

/// Map a non-success status to the shared error taxonomy.
///
/// `resource` names what a 404 refers to, e.g. `model 'gpt-4o'`.
pub(crate) fn classify_status(status: StatusCode, body: &str, resource: &str) -> Error {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
        StatusCode::BAD_REQUEST if message.is_empty() => {
            Error::BadRequest("unknown error".to_string())
        }
        StatusCode::BAD_REQUEST => Error::BadRequest(message),
        StatusCode::NOT_FOUND => Error::NotFound(resource.to_string()),
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Send a request and return the status and body text, whatever the status.
pub(crate) async fn send(vendor: &str, request: RequestBuilder) -> Result<(StatusCode, String)> {
    let response = request.send().await.map_err(|e| {
        tracing::error!("Failed to send request to {}: {}", vendor, e);
        e
    })?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!("{} API error (status {}): {}", vendor, status, snippet(&body));
    }

    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_vendor_message() {
        let body = r#"{"error": {"message": "Invalid image", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid image");
    }

    #[test]
    fn test_error_message_falls_back_to_body_snippet() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), BODY_SNIPPET_CHARS);
        assert_eq!(error_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "", "m"),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "", "m"),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "", "m"),
            Error::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "", "model 'x'"),
            Error::NotFound(r) if r == "model 'x'"
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream", "m"),
            Error::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_bad_request_surfaces_message_verbatim() {
        let body = r#"{"error": {"message": "Image too large: 25MB"}}"#;
        match classify_status(StatusCode::BAD_REQUEST, body, "m") {
            Error::BadRequest(msg) => assert_eq!(msg, "Image too large: 25MB"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_request_without_body() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "", "m"),
            Error::BadRequest(msg) if msg == "unknown error"
        ));
    }
}
