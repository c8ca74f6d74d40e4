use crate::types::Language;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    // Upper bound of the additive random term, applied after capping.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            jitter_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 8192,
        }
    }
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: String,
    pub base_url: String,
    pub language: Language,
    pub retry: RetryConfig,
    pub generation: GenerationParams,

    // Secrets are stored outside this struct at rest.
    pub api_key_present: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            language: Language::default(),
            retry: RetryConfig::default(),
            generation: GenerationParams::default(),
            api_key_present: false,
        }
    }
}

/// Read-only snapshot of everything one `parse()` call needs.
#[derive(Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub language: Language,
    pub retry: RetryConfig,
    pub generation: GenerationParams,
}

impl AiConfig {
    pub fn from_app_config(cfg: &AppConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            language: cfg.language,
            retry: cfg.retry.clone(),
            generation: cfg.generation.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("retry", &self.retry)
            .field("generation", &self.generation)
            .finish()
    }
}
