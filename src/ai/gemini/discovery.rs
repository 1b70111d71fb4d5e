//! Model selection from a `listModels` response.

use super::types::ListModelsResponse;

/// Tried in order when the preferred model is not offered.
pub const FALLBACK_MODELS: [&str; 3] = [
    "gemini-1.5-flash",
    "gemini-1.5-pro-latest",
    "gemini-pro-vision",
];

const GENERATE_CONTENT: &str = "generateContent";

/// Bare IDs of models that support `generateContent`, in listing order.
pub fn capable_models(listing: &ListModelsResponse) -> Vec<String> {
    listing
        .models
        .iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == GENERATE_CONTENT)
        })
        .map(|m| bare_model_id(&m.name).to_string())
        .collect()
}

/// `models/gemini-1.5-flash` -> `gemini-1.5-flash`.
pub fn bare_model_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Preferred model, then the first offered fallback, then whatever comes first.
pub fn select_model(available: &[String], preferred: &str) -> Option<String> {
    if available.iter().any(|m| m == preferred) {
        return Some(preferred.to_string());
    }

    FALLBACK_MODELS
        .iter()
        .find(|fallback| available.iter().any(|m| m == *fallback))
        .map(|fallback| fallback.to_string())
        .or_else(|| available.first().cloned())
}
