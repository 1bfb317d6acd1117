use crate::config::constants::retry;
use crate::llm::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff policy for vendor calls, as written in `harness.toml`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Wall-clock budget for one attempt; 0 disables the budget
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
            attempt_timeout: (settings.attempt_timeout_ms > 0)
                .then(|| Duration::from_millis(settings.attempt_timeout_ms)),
        }
    }
}

fn default_max_attempts() -> u32 {
    retry::MAX_ATTEMPTS
}
fn default_initial_delay_ms() -> u64 {
    retry::INITIAL_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    retry::MAX_DELAY_MS
}
fn default_backoff_multiplier() -> f64 {
    retry::BACKOFF_MULTIPLIER
}
fn default_attempt_timeout_ms() -> u64 {
    retry::ATTEMPT_TIMEOUT_MS
}
