use admitnote_core::messages::Message;
use admitnote_core::types::Language;
use thiserror::Error;

/// Bad or missing local input. Never sent to the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("no clinical notes or image supplied")]
    EmptyInput,
    #[error("image is {bytes} bytes, limit is {limit}")]
    ImageTooLarge { bytes: usize, limit: usize },
    #[error("API key is malformed: {0}")]
    MalformedApiKey(String),
    #[error("request could not be built: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("network unavailable: {0}")]
    Connectivity(String),
    #[error("service responded with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Service { status: u16, message: Option<String> },
    #[error("malformed AI response: {0}")]
    MalformedResponse(String),
}

impl ParseError {
    pub fn service(status: u16, message: Option<String>) -> Self {
        ParseError::Service { status, message }
    }

    pub fn user_message(&self, lang: Language) -> String {
        self.message().text(lang)
    }

    pub fn message(&self) -> Message {
        match self {
            ParseError::Validation(ValidationError::MissingApiKey) => Message::MissingApiKey,
            ParseError::Validation(ValidationError::EmptyInput) => Message::EmptyInput,
            ParseError::Validation(ValidationError::ImageTooLarge { limit, .. }) => {
                Message::ImageTooLarge {
                    limit_mb: limit / (1024 * 1024),
                }
            }
            ParseError::Validation(ValidationError::MalformedApiKey(_)) => Message::InvalidApiKey,
            ParseError::Validation(ValidationError::InvalidRequest(_)) => {
                Message::InvalidConfiguration
            }
            ParseError::Connectivity(_) => Message::NetworkUnavailable,
            ParseError::Service { status, message } => match status {
                401 | 403 => Message::InvalidApiKey,
                400 if mentions_api_key(message.as_deref()) => Message::InvalidApiKey,
                429 => Message::RateLimited,
                500 | 502 | 503 => Message::ServiceUnavailable,
                404 => Message::ModelNotFound,
                other => Message::ServiceError { status: *other },
            },
            ParseError::MalformedResponse(_) => Message::InvalidResponse,
        }
    }
}

fn mentions_api_key(message: Option<&str>) -> bool {
    message.is_some_and(|m| m.to_ascii_lowercase().contains("api key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_invalid_key() {
        for status in [401, 403] {
            assert_eq!(
                ParseError::service(status, None).message(),
                Message::InvalidApiKey
            );
        }
        let bad_key = ParseError::service(400, Some("API key not valid.".into()));
        assert_eq!(bad_key.message(), Message::InvalidApiKey);
        let bad_body = ParseError::service(400, Some("Invalid JSON payload".into()));
        assert_eq!(bad_body.message(), Message::ServiceError { status: 400 });
    }

    #[test]
    fn display_is_diagnostic() {
        let e = ParseError::service(503, Some("overloaded".into()));
        assert_eq!(e.to_string(), "service responded with status 503: overloaded");
        let e = ParseError::service(500, None);
        assert_eq!(e.to_string(), "service responded with status 500: no message");
    }

    #[test]
    fn unbuildable_request_blames_config_not_key() {
        let bad_url = ParseError::from(ValidationError::InvalidRequest("relative URL".into()));
        assert_eq!(bad_url.message(), Message::InvalidConfiguration);
        assert_eq!(
            bad_url.user_message(Language::EnglishUs),
            "Invalid configuration, please check the model name and service URL"
        );

        let bad_key = ParseError::from(ValidationError::MalformedApiKey("newline".into()));
        assert_eq!(bad_key.message(), Message::InvalidApiKey);
    }

    #[test]
    fn image_limit_is_reported_in_megabytes() {
        let e = ParseError::from(ValidationError::ImageTooLarge {
            bytes: 30 * 1024 * 1024,
            limit: 20 * 1024 * 1024,
        });
        assert_eq!(e.message(), Message::ImageTooLarge { limit_mb: 20 });
    }
}
