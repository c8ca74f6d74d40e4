use admitnote_core::envelope::ResponseEnvelope;
use anyhow::Context;
use serde::Deserialize;

pub fn parse_generate_content(body: &[u8]) -> anyhow::Result<ResponseEnvelope> {
    serde_json::from_slice(body).context("decode generateContent JSON")
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// The service's own error message, if the body carries one.
pub fn parse_service_error(body: &[u8]) -> Option<String> {
    let parsed: ServiceErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
