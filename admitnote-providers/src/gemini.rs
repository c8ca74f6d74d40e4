use crate::request::HttpRequest;
use admitnote_core::envelope::RequestEnvelope;
use anyhow::{Context, anyhow};
use serde_json::json;
use url::Url;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// `{base}/models/{model}:generateContent`
pub fn generate_content_url(base_url: &str, model: &str) -> anyhow::Result<Url> {
    let model = model.trim();
    if model.is_empty() {
        return Err(anyhow!("model identifier is empty"));
    }

    let mut url =
        Url::parse(base_url.trim()).with_context(|| format!("invalid base url: {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("base url cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .push("models")
        .push(&format!("{model}:generateContent"));
    Ok(url)
}

pub fn build_generate_content_request(
    cfg: &GeminiConfig,
    envelope: &RequestEnvelope,
) -> anyhow::Result<HttpRequest> {
    let url = generate_content_url(&cfg.base_url, &cfg.model)?;

    let payload = json!({
        "contents": [{ "parts": envelope.parts() }],
        "generationConfig": {
            "temperature": envelope.generation.temperature,
            "maxOutputTokens": envelope.generation.max_output_tokens,
        },
    });

    Ok(HttpRequest::post_json(url.as_str(), &payload).with_header(API_KEY_HEADER, &cfg.api_key))
}
