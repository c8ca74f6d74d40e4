use crate::error::{ParseError, ValidationError};
use crate::payload::select_payload_text;
use crate::retry::{RetryDecision, RetryState, next_delay};
use crate::session::{ParseStage, display_secs, ms};
use crate::traits::{
    AiTransport, ConnectivityProbe, NoopObserver, ParseObserver, TransportError, TransportTarget,
};
use admitnote_core::config::AiConfig;
use admitnote_core::envelope::{InlineImage, RequestEnvelope};
use admitnote_core::json_repair::extract_and_repair;
use admitnote_core::messages::Message;
use admitnote_core::prompt::build_instruction;
use admitnote_core::types::{ClinicalData, Language, RequestId, StatusKind};
use admitnote_providers::image::MAX_INLINE_IMAGE_BYTES;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseInput {
    pub text: String,
    pub image: Option<InlineImage>,
}

impl ParseInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Turns free-text notes (and optionally an image) into [`ClinicalData`].
///
/// Holds no per-call state; overlapping calls are independent.
pub struct Orchestrator {
    transport: Arc<dyn AiTransport>,
    connectivity: Arc<dyn ConnectivityProbe>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn AiTransport>, connectivity: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            transport,
            connectivity,
        }
    }

    pub async fn parse(
        &self,
        cfg: &AiConfig,
        input: &ParseInput,
    ) -> Result<ClinicalData, ParseError> {
        self.parse_with_observer(cfg, input, &NoopObserver).await
    }

    /// Same as `parse`, but reports progress through `observer`.
    pub async fn parse_with_observer(
        &self,
        cfg: &AiConfig,
        input: &ParseInput,
        observer: &dyn ParseObserver,
    ) -> Result<ClinicalData, ParseError> {
        let id = RequestId::new();
        let lang = cfg.language;

        if let Err(e) = validate(cfg, input) {
            return Err(surface(id, lang, observer, e.into()));
        }

        let envelope = RequestEnvelope::new(
            build_instruction(&input.text),
            input.image.clone(),
            cfg.generation.clone(),
        );
        let target = TransportTarget {
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
        };

        let mut state = RetryState::new(cfg.retry.max_attempts);
        let started = Instant::now();

        loop {
            let attempt = state.begin_attempt();
            let (stage, status) = if attempt == 1 {
                (ParseStage::Start, Message::Analyzing)
            } else {
                (
                    ParseStage::Retry,
                    Message::Retrying {
                        attempt,
                        max_attempts: state.max_attempts,
                    },
                )
            };
            log::info!(
                "[{id}] {} attempt {attempt}/{} model={} image={}",
                stage.label(),
                state.max_attempts,
                target.model,
                envelope.has_image()
            );
            observer.on_status(&status.text(lang), StatusKind::Loading);

            match self.attempt(id, lang, &target, &envelope, observer).await {
                Ok(data) => {
                    log::info!(
                        "[{id}] {} after {attempt} attempt(s), {} fields, {}ms",
                        ParseStage::Done.label(),
                        data.0.len(),
                        ms(started.elapsed())
                    );
                    observer.on_status(&Message::AnalysisDone.text(lang), StatusKind::Success);
                    observer.on_success(&data);
                    return Ok(data);
                }
                Err(e) => {
                    log::warn!("[{id}] attempt {attempt} failed: {e}");
                    match state.record_failure(e) {
                        RetryDecision::Retry => {
                            let delay = next_delay(attempt - 1, &cfg.retry);
                            log::info!("[{id}] retrying in {}ms", ms(delay));
                            observer.on_status(
                                &Message::RetryingIn {
                                    seconds: display_secs(delay),
                                }
                                .text(lang),
                                StatusKind::Loading,
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::GiveUp(e) => return Err(surface(id, lang, observer, e)),
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        id: RequestId,
        lang: Language,
        target: &TransportTarget,
        envelope: &RequestEnvelope,
        observer: &dyn ParseObserver,
    ) -> Result<ClinicalData, ParseError> {
        if !self.connectivity.is_online() {
            return Err(ParseError::Connectivity(
                "connectivity check reports offline".into(),
            ));
        }

        let response = self
            .transport
            .generate_content(target, envelope)
            .await
            .map_err(from_transport)?;

        log::debug!(
            "[{id}] {}: {} candidate(s)",
            ParseStage::Parse.label(),
            response.candidates.len()
        );
        observer.on_status(&Message::ParsingResponse.text(lang), StatusKind::Loading);

        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ParseError::MalformedResponse("response has no candidates".into()))?;
        if candidate.is_truncated() {
            log::warn!("[{id}] candidate hit MAX_TOKENS; payload may be truncated");
        }

        let text = select_payload_text(candidate).ok_or_else(|| {
            ParseError::MalformedResponse("candidate carries no text parts".into())
        })?;
        let repaired = extract_and_repair(text);
        if repaired != text.trim() {
            log::debug!(
                "[{id}] payload rewritten by repair ({} -> {} chars)",
                text.len(),
                repaired.len()
            );
        }

        let value: serde_json::Value = serde_json::from_str(&repaired).map_err(|e| {
            ParseError::MalformedResponse(format!("payload is not valid JSON after repair: {e}"))
        })?;
        ClinicalData::from_value(value)
            .ok_or_else(|| ParseError::MalformedResponse("payload is not a JSON object".into()))
    }
}

fn validate(cfg: &AiConfig, input: &ParseInput) -> Result<(), ValidationError> {
    if !cfg.has_api_key() {
        return Err(ValidationError::MissingApiKey);
    }

    let image = input.image.as_ref().filter(|img| !img.data.is_empty());
    if input.text.trim().is_empty() && image.is_none() {
        return Err(ValidationError::EmptyInput);
    }

    if let Some(img) = image {
        let bytes = img.decoded_len();
        if bytes > MAX_INLINE_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge {
                bytes,
                limit: MAX_INLINE_IMAGE_BYTES,
            });
        }
    }

    Ok(())
}

fn from_transport(e: TransportError) -> ParseError {
    match e {
        TransportError::Unreachable(msg) => ParseError::Connectivity(msg),
        TransportError::Status { status, message } => ParseError::service(status, message),
        TransportError::InvalidBody(msg) => ParseError::MalformedResponse(msg),
        TransportError::InvalidRequest(msg) => ValidationError::InvalidRequest(msg).into(),
        TransportError::InvalidCredential(msg) => ValidationError::MalformedApiKey(msg).into(),
    }
}

fn surface(
    id: RequestId,
    lang: Language,
    observer: &dyn ParseObserver,
    err: ParseError,
) -> ParseError {
    let message = err.user_message(lang);
    log::error!("[{id}] {}: {err}", ParseStage::Error.label());
    observer.on_status(&message, StatusKind::Error);
    observer.on_error(&err, &message);
    err
}
