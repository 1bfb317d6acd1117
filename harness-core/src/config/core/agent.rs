use crate::config::constants::{defaults, models};
use serde::{Deserialize, Serialize};

/// Evaluation-run configuration shared by every episode
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Provider adapter used for episodes (currently only "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name, including the `-FC` suffix for function-calling mode
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature forwarded to the vendor
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of queries per user round before the episode is stopped
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Number of episodes evaluated concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_steps: default_max_steps(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_provider() -> String {
    defaults::DEFAULT_PROVIDER.to_string()
}
fn default_model() -> String {
    models::google::DEFAULT_MODEL.to_string()
}
fn default_temperature() -> f32 {
    defaults::DEFAULT_TEMPERATURE
}
fn default_max_steps() -> usize {
    defaults::DEFAULT_MAX_STEPS
}
fn default_concurrency() -> usize {
    defaults::DEFAULT_CONCURRENCY
}
