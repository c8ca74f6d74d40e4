//! Continuous dictation on top of a platform speech recognizer.
//!
//! The manager is a two-state machine. While `Active`, a platform-initiated
//! end of stream (browsers silently end long continuous sessions) restarts
//! the recognizer without telling the caller. An explicit [`stop`] moves to
//! `Idle` first, so the next end event is reported as a real stop.
//!
//! Platform start/stop failures are swallowed: they are "already started" /
//! "already stopped" races, not failures of intent.
//!
//! [`stop`]: VoiceSessionManager::stop

use admitnote_core::messages::Message;
use admitnote_core::types::Language;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language_tag: String,
}

impl RecognizerOptions {
    pub fn dictation(lang: Language) -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language_tag: lang.tag().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("recognition already started")]
    AlreadyStarted,
    #[error("recognition is not running")]
    NotRunning,
    #[error("platform error: {0}")]
    Platform(String),
}

pub trait SpeechRecognizer {
    fn start(&mut self) -> Result<(), SpeechError>;
    fn stop(&mut self) -> Result<(), SpeechError>;
    fn set_language(&mut self, tag: &str);
}

pub trait SpeechPlatform {
    /// `None` when the host offers no speech recognition.
    fn create_recognizer(&self, opts: &RecognizerOptions) -> Option<Box<dyn SpeechRecognizer>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

/// Incremental result list as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultBatch {
    /// First entry that changed since the previous event.
    pub result_index: usize,
    pub results: Vec<RecognitionResult>,
}

impl ResultBatch {
    /// Final entries from `result_index` on, each followed by a space.
    pub fn final_transcript(&self) -> String {
        let mut out = String::new();
        for r in self.results.iter().skip(self.result_index) {
            if r.is_final {
                out.push_str(&r.transcript);
                out.push(' ');
            }
        }
        out
    }
}

type TextCallback = Box<dyn FnMut(&str)>;
type UnitCallback = Box<dyn FnMut()>;

#[derive(Default)]
pub struct VoiceCallbacks {
    on_result: Option<TextCallback>,
    on_error: Option<TextCallback>,
    on_start: Option<UnitCallback>,
    on_end: Option<UnitCallback>,
}

impl VoiceCallbacks {
    pub fn on_result(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_end(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    fn result(&mut self, text: &str) {
        if let Some(f) = self.on_result.as_mut() {
            f(text);
        }
    }

    fn error(&mut self, message: &str) {
        if let Some(f) = self.on_error.as_mut() {
            f(message);
        }
    }

    fn started(&mut self) {
        if let Some(f) = self.on_start.as_mut() {
            f();
        }
    }

    fn ended(&mut self) {
        if let Some(f) = self.on_end.as_mut() {
            f();
        }
    }
}

pub struct VoiceSessionManager {
    platform: Box<dyn SpeechPlatform>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    state: VoiceState,
    language: Language,
    callbacks: VoiceCallbacks,
    // Set by `stop()` until the platform confirms the stream ended.
    end_pending: bool,
}

impl VoiceSessionManager {
    pub fn new(platform: Box<dyn SpeechPlatform>, language: Language) -> Self {
        Self {
            platform,
            recognizer: None,
            state: VoiceState::Idle,
            language,
            callbacks: VoiceCallbacks::default(),
            end_pending: false,
        }
    }

    pub fn set_callbacks(&mut self, callbacks: VoiceCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == VoiceState::Active
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn start(&mut self) -> VoiceState {
        if self.state == VoiceState::Active {
            log::debug!("voice: start ignored, already active");
            return self.state;
        }

        if self.recognizer.is_none() {
            let opts = RecognizerOptions::dictation(self.language);
            match self.platform.create_recognizer(&opts) {
                Some(r) => self.recognizer = Some(r),
                None => {
                    log::warn!("voice: speech recognition unavailable on this platform");
                    let message = Message::VoiceNotSupported.text(self.language);
                    self.callbacks.error(&message);
                    return self.state;
                }
            }
        }

        self.state = VoiceState::Active;
        self.end_pending = false;
        self.start_recognizer();
        log::info!("voice: started ({})", self.language.tag());
        self.callbacks.started();
        self.state
    }

    pub fn stop(&mut self) -> VoiceState {
        if self.state == VoiceState::Idle {
            // A stop already in flight reports its own end.
            if !self.end_pending {
                self.callbacks.ended();
            }
            return self.state;
        }

        // Idle first, so the coming end event is not taken for a dropped stream.
        self.state = VoiceState::Idle;

        match self.recognizer.as_mut() {
            Some(r) => {
                self.end_pending = true;
                if let Err(e) = r.stop() {
                    log::debug!("voice: stop ignored: {e}");
                }
            }
            None => self.callbacks.ended(),
        }
        self.state
    }

    pub fn toggle(&mut self) -> VoiceState {
        match self.state {
            VoiceState::Active => self.stop(),
            VoiceState::Idle => self.start(),
        }
    }

    /// Takes effect on the next stream start; engines pin language per stream.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let Some(r) = self.recognizer.as_mut() {
            r.set_language(language.tag());
        }
    }

    pub fn handle_results(&mut self, batch: &ResultBatch) {
        // Finals flushed between stop() and the end event still count.
        if self.state == VoiceState::Idle && !self.end_pending {
            return;
        }
        let delta = batch.final_transcript();
        if !delta.is_empty() {
            self.callbacks.result(&delta);
        }
    }

    pub fn handle_error(&mut self, kind: &str) {
        if self.state == VoiceState::Active {
            self.stop();
        }
        log::warn!("voice: platform error: {kind}");
        let message = Message::VoiceError {
            kind: kind.to_string(),
        }
        .text(self.language);
        self.callbacks.error(&message);
    }

    pub fn handle_end(&mut self) {
        match self.state {
            VoiceState::Active => {
                log::info!("voice: stream ended by platform, restarting");
                self.start_recognizer();
            }
            VoiceState::Idle => {
                if self.end_pending {
                    self.end_pending = false;
                    log::info!("voice: stopped");
                    self.callbacks.ended();
                }
            }
        }
    }

    fn start_recognizer(&mut self) {
        if let Some(r) = self.recognizer.as_mut() {
            if let Err(e) = r.start() {
                log::debug!("voice: start ignored: {e}");
            }
        }
    }
}
