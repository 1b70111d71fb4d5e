//! Data models and structures
//!
//! Defines the request options, credentials, and configuration shared by
//! both vision providers.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Token budget for [`DetailLevel::Low`], regardless of the caller's request.
pub const LOW_DETAIL_TOKENS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(Error::Config(format!(
                "Unknown AI provider '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    Low,
    #[default]
    Auto,
    High,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 3] = [DetailLevel::Low, DetailLevel::Auto, DetailLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Low => "low",
            DetailLevel::Auto => "auto",
            DetailLevel::High => "high",
        }
    }

    /// Resolve the output token budget for this tier.
    ///
    /// Only `High` honors `requested`; `Low` is fixed and `Auto` uses the
    /// vendor's own budget.
    pub fn token_budget(&self, requested: u32, auto_budget: u32) -> u32 {
        match self {
            DetailLevel::Low => LOW_DETAIL_TOKENS,
            DetailLevel::Auto => auto_budget,
            DetailLevel::High => requested,
        }
    }
}

/// Lossy parse: anything unrecognized is the balanced `Auto` tier.
impl From<&str> for DetailLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => DetailLevel::Low,
            "high" => DetailLevel::High,
            _ => DetailLevel::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Es,
    En,
    Fr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Es, Language::En, Language::Fr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

/// Lossy parse: unknown codes fall back to Spanish.
impl From<&str> for Language {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Language::En,
            "fr" => Language::Fr,
            _ => Language::Es,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionOptions {
    pub detail: DetailLevel,
    pub language: Language,
    pub max_tokens: u32,
}

impl DescriptionOptions {
    pub fn new(detail: DetailLevel, language: Language, max_tokens: u32) -> Self {
        Self {
            detail,
            language,
            max_tokens,
        }
    }
}

impl Default for DescriptionOptions {
    fn default() -> Self {
        Self::new(DetailLevel::Auto, Language::Es, DEFAULT_MAX_TOKENS)
    }
}

/// Vendor credential. The value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: AiProvider,
    pub openai_api_key: Option<ApiKey>,
    pub gemini_api_key: Option<ApiKey>,
    pub openai_model: String,
    pub gemini_model: String,
    pub options: DescriptionOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::OpenAi,
        };

        let max_tokens = match non_empty("DESCRIBE_MAX_TOKENS") {
            Some(value) => parse_max_tokens(&value)?,
            None => DEFAULT_MAX_TOKENS,
        };

        let config = Self {
            provider,
            openai_api_key: non_empty("OPENAI_API_KEY").map(ApiKey::new),
            gemini_api_key: non_empty("GEMINI_API_KEY").map(ApiKey::new),
            openai_model: non_empty("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            options: DescriptionOptions {
                detail: non_empty("DESCRIBE_DETAIL")
                    .map(|v| DetailLevel::from(v.as_str()))
                    .unwrap_or_default(),
                language: non_empty("DESCRIBE_LANGUAGE")
                    .map(|v| Language::from(v.as_str()))
                    .unwrap_or_default(),
                max_tokens,
            },
        };

        config.api_key()?;
        Ok(config)
    }

    /// Credential for the selected provider.
    pub fn api_key(&self) -> Result<&ApiKey> {
        let (key, var) = match self.provider {
            AiProvider::OpenAi => (self.openai_api_key.as_ref(), "OPENAI_API_KEY"),
            AiProvider::Gemini => (self.gemini_api_key.as_ref(), "GEMINI_API_KEY"),
        };
        key.ok_or_else(|| {
            Error::Config(format!(
                "{} not set (required for provider '{}')",
                var, self.provider
            ))
        })
    }
}

pub fn parse_max_tokens(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "Invalid max tokens '{}'. Expected a positive integer",
            value
        ))),
    }
}
