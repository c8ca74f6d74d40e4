//! Failure classification and exponential backoff.

use crate::error::ParseError;
use admitnote_core::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Statuses worth retrying: rate limiting and transient server trouble.
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 500, 502, 503];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Fatal,
}

/// Pure function of the error; attempt counts play no part.
pub fn classify(err: &ParseError) -> FailureClass {
    match err {
        ParseError::Connectivity(_) => FailureClass::Retryable,
        ParseError::Service { status, .. } if RETRYABLE_STATUSES.contains(status) => {
            FailureClass::Retryable
        }
        ParseError::Service { .. } => FailureClass::Fatal,
        ParseError::MalformedResponse(_) => FailureClass::Fatal,
        ParseError::Validation(_) => FailureClass::Fatal,
    }
}

/// `min(initial * multiplier^attempt, max)` in milliseconds, before jitter.
pub fn capped_delay_ms(attempt: u32, cfg: &RetryConfig) -> u64 {
    let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = cfg.initial_delay_ms as f64 * cfg.multiplier.powi(exp);
    // Float-to-int casts saturate, so an overflowing power lands on the cap.
    (raw.min(cfg.max_delay_ms as f64).max(0.0)) as u64
}

/// Delay before the retry that follows failed attempt `attempt` (0-indexed).
///
/// Jitter is added after capping, so the upper bound is `max + jitter`.
pub fn next_delay(attempt: u32, cfg: &RetryConfig) -> Duration {
    next_delay_with(attempt, cfg, &mut rand::thread_rng())
}

pub fn next_delay_with<R: Rng + ?Sized>(attempt: u32, cfg: &RetryConfig, rng: &mut R) -> Duration {
    let jitter = rng.gen_range(0..=cfg.jitter_ms);
    Duration::from_millis(capped_delay_ms(attempt, cfg).saturating_add(jitter))
}

/// Bookkeeping for one top-level call.
#[derive(Debug)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
    pub last_error: Option<ParseError>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
        }
    }

    /// Starts the next attempt and returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    pub fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Records a failure and decides whether another attempt follows.
    pub fn record_failure(&mut self, err: ParseError) -> RetryDecision {
        let retry = classify(&err) == FailureClass::Retryable && self.has_remaining();
        self.last_error = Some(err.clone());
        if retry {
            RetryDecision::Retry
        } else {
            RetryDecision::GiveUp(err)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    GiveUp(ParseError),
}
