//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Provider
//! failures are categorized so callers can tell an invalid credential from a
//! rate limit, a safety block, or a dropped connection.

use std::fmt;
use thiserror::Error;

/// Why a vendor refused to return a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Gemini `finishReason: SAFETY`.
    Safety,
    /// Gemini `finishReason: RECITATION`.
    Recitation,
    /// OpenAI `finish_reason: content_filter`.
    ContentFilter,
    /// Gemini `promptFeedback.blockReason`, kept verbatim.
    Prompt(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Safety => write!(f, "blocked by safety filters"),
            BlockReason::Recitation => write!(f, "blocked by recitation detection"),
            BlockReason::ContentFilter => write!(f, "blocked by content filter"),
            BlockReason::Prompt(reason) => write!(f, "prompt blocked ({})", reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Response {0}")]
    SafetyBlocked(BlockReason),

    #[error("Token limit reached before any text was generated")]
    TruncatedNoContent,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No compatible model found: {0}")]
    NoCompatibleModel(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Connection(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
