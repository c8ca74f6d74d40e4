use crate::error::ParseError;
use admitnote_core::envelope::{RequestEnvelope, ResponseEnvelope};
use admitnote_core::types::{ClinicalData, StatusKind};
use async_trait::async_trait;
use thiserror::Error;

/// Where a request goes. Read fresh from configuration on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportTarget {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for TransportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportTarget")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Never reached the server (DNS, refused, timeout, dropped connection).
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("status {status}")]
    Status { status: u16, message: Option<String> },
    /// Success status, but the body is not a response envelope.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
    /// Config values (model, base URL) that cannot form a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The API key cannot be sent as given.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

#[async_trait]
pub trait AiTransport: Send + Sync {
    async fn generate_content(
        &self,
        target: &TransportTarget,
        envelope: &RequestEnvelope,
    ) -> Result<ResponseEnvelope, TransportError>;
}

pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Notification channel for one `parse()` call.
///
/// Implementations must be fast; they run inline with the retry loop.
pub trait ParseObserver: Send + Sync {
    fn on_status(&self, _message: &str, _kind: StatusKind) {}
    fn on_success(&self, _data: &ClinicalData) {}
    fn on_error(&self, _error: &ParseError, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ParseObserver for NoopObserver {}
