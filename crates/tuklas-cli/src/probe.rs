//! Gemini endpoint probe.
//!
//! Lists the models visible to the configured key via
//! `GET {base}/v1beta/models?key=…`, which doubles as a key check.

use serde::Deserialize;

/// A single model entry returned by the `models` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    /// Resource name, e.g. `models/gemini-1.5-flash-latest`.
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl GeminiModel {
    /// Name without the `models/` prefix, as used in request paths.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn can_generate(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

/// Fetch the models that support `generateContent`.
///
/// Returns `Err(reason)` when the service is unreachable or rejects the key.
pub fn fetch_models(base_url: &str, api_key: &str) -> Result<Vec<GeminiModel>, String> {
    let endpoint = format!("{}/v1beta/models", base_url.trim_end_matches('/'));
    let url = reqwest::Url::parse_with_params(&endpoint, &[("key", api_key)])
        .map_err(|e| format!("Invalid API URL {}: {}", endpoint, e))?;

    let response = reqwest::blocking::get(url)
        .map_err(|e| format!("Gemini unreachable at {}: {}", endpoint, e.without_url()))?;

    if !response.status().is_success() {
        return Err(format!("Gemini returned HTTP {}", response.status()));
    }

    let listing: ModelsResponse = response
        .json()
        .map_err(|e| format!("Failed to parse models response: {}", e))?;

    Ok(listing
        .models
        .into_iter()
        .filter(GeminiModel::can_generate)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_parses_and_filters() {
        let raw = r#"{
            "models": [
                {"name": "models/gemini-1.5-flash-latest",
                 "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/text-embedding-004",
                 "supportedGenerationMethods": ["embedContent"]}
            ]
        }"#;
        let listing: ModelsResponse = serde_json::from_str(raw).unwrap();
        let usable: Vec<_> = listing.models.iter().filter(|m| m.can_generate()).collect();
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].short_name(), "gemini-1.5-flash-latest");
    }

    #[test]
    fn unreachable_service_is_an_error() {
        assert!(fetch_models("http://127.0.0.1:1", "k").is_err());
    }
}
