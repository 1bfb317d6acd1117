//! Credential lookup for vendor APIs.
//!
//! Environment variables are checked first (after loading an optional `.env`
//! file); there is no config-file fallback so secrets never land in
//! `harness.toml`.

use crate::config::constants::env;
use crate::config::core::{GeminiConfig, GeminiEndpoint};
use anyhow::{Result, bail};
use tracing::{debug, warn};

/// Credential attached to every Gemini request
#[derive(Clone, PartialEq, Eq)]
pub enum GeminiCredential {
    /// `?key=` query parameter (AI Studio)
    ApiKey(String),
    /// `Authorization: Bearer` header (Vertex AI)
    AccessToken(String),
    /// No credential; only useful against local mock servers
    Anonymous,
}

impl std::fmt::Debug for GeminiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiCredential::ApiKey(_) => f.write_str("ApiKey(***)"),
            GeminiCredential::AccessToken(_) => f.write_str("AccessToken(***)"),
            GeminiCredential::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Load environment variables from a `.env` file if one exists
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment from .env"),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "failed to load .env file"),
    }
}

/// Resolve the credential for the configured Gemini endpoint
pub fn gemini_credential(config: &GeminiConfig) -> Result<GeminiCredential> {
    match config.endpoint {
        GeminiEndpoint::AiStudio => {
            if let Some(key) = read_env(&config.api_key_env).or_else(|| read_env(env::GOOGLE_API_KEY))
            {
                return Ok(GeminiCredential::ApiKey(key));
            }
            bail!(
                "Set {} or {} in your environment",
                config.api_key_env,
                env::GOOGLE_API_KEY
            )
        }
        GeminiEndpoint::Vertex => {
            if let Some(token) = read_env(&config.access_token_env) {
                return Ok(GeminiCredential::AccessToken(token));
            }
            if !config.base_url.trim().is_empty() {
                // Custom endpoints (proxies, mocks) may not need auth.
                return Ok(GeminiCredential::Anonymous);
            }
            bail!(
                "Set {} in your environment (e.g. `gcloud auth print-access-token`)",
                config.access_token_env
            )
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
