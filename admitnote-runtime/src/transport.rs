use admitnote_core::envelope::{RequestEnvelope, ResponseEnvelope};
use admitnote_engine::traits::{AiTransport, TransportError, TransportTarget};
use admitnote_providers::gemini::{API_KEY_HEADER, GeminiConfig, build_generate_content_request};
use admitnote_providers::parse::{parse_generate_content, parse_service_error};
use admitnote_providers::runtime::{ExecuteError, execute};

/// Talks to the Gemini `generateContent` endpoint over HTTPS.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiTransport;

impl GeminiTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl AiTransport for GeminiTransport {
    async fn generate_content(
        &self,
        target: &TransportTarget,
        envelope: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, TransportError> {
        let cfg = GeminiConfig {
            base_url: target.base_url.clone(),
            api_key: target.api_key.clone(),
            model: target.model.clone(),
        };

        let req = build_generate_content_request(&cfg, envelope)
            .map_err(|e| TransportError::InvalidRequest(format!("{e:#}")))?;

        let resp = execute(&req).await.map_err(map_execute_error)?;

        if !resp.is_success() {
            let message = parse_service_error(&resp.body);
            log::warn!(
                "gemini returned {} ({})",
                resp.status,
                message.as_deref().unwrap_or("no message")
            );
            return Err(TransportError::Status {
                status: resp.status,
                message,
            });
        }

        parse_generate_content(&resp.body)
            .map_err(|e| TransportError::InvalidBody(format!("{e:#}")))
    }
}

fn map_execute_error(e: ExecuteError) -> TransportError {
    match e {
        ExecuteError::InvalidRequest(m) => TransportError::InvalidRequest(m),
        ExecuteError::InvalidHeader { name } if name.eq_ignore_ascii_case(API_KEY_HEADER) => {
            TransportError::InvalidCredential(format!("API key cannot be sent in {name}"))
        }
        ExecuteError::InvalidHeader { name } => {
            TransportError::InvalidRequest(format!("invalid value for header {name}"))
        }
        ExecuteError::Timeout => TransportError::Unreachable("request timed out".into()),
        ExecuteError::Unreachable(m) | ExecuteError::Body(m) => TransportError::Unreachable(m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_count_as_unreachable() {
        assert_eq!(
            map_execute_error(ExecuteError::Timeout),
            TransportError::Unreachable("request timed out".into())
        );
        assert!(matches!(
            map_execute_error(ExecuteError::InvalidRequest("unsupported method".into())),
            TransportError::InvalidRequest(_)
        ));
    }

    #[test]
    fn only_the_key_header_counts_as_a_credential_problem() {
        assert!(matches!(
            map_execute_error(ExecuteError::InvalidHeader {
                name: "x-goog-api-key".into()
            }),
            TransportError::InvalidCredential(_)
        ));
        assert!(matches!(
            map_execute_error(ExecuteError::InvalidHeader {
                name: "content-type".into()
            }),
            TransportError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn bad_base_url_is_a_request_problem() {
        let target = TransportTarget {
            base_url: "not a url".into(),
            model: "gemini-2.5-flash".into(),
            api_key: "AIza-test".into(),
        };
        let envelope = RequestEnvelope::new("notes", None, Default::default());

        let err = GeminiTransport::new()
            .generate_content(&target, &envelope)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
