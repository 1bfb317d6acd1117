use crate::config::constants::{defaults, env, urls};
use serde::{Deserialize, Serialize};

/// Which Google surface serves `generateContent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeminiEndpoint {
    /// Vertex AI, authenticated with an OAuth access token
    #[default]
    Vertex,
    /// Generative Language API, authenticated with an API key
    AiStudio,
}

/// Gemini provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub endpoint: GeminiEndpoint,

    /// Override for the API base URL; derived from the endpoint when empty
    #[serde(default)]
    pub base_url: String,

    /// Vertex project; falls back to `VERTEX_AI_PROJECT_ID`
    #[serde(default)]
    pub project_id: Option<String>,

    /// Vertex region; falls back to `VERTEX_AI_LOCATION`, then `us-central1`
    #[serde(default)]
    pub location: Option<String>,

    /// Environment variable holding the AI Studio API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Environment variable holding the Vertex access token
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: GeminiEndpoint::default(),
            base_url: String::new(),
            project_id: None,
            location: None,
            api_key_env: default_api_key_env(),
            access_token_env: default_access_token_env(),
        }
    }
}

impl GeminiConfig {
    /// Vertex region after applying environment fallbacks
    pub fn resolved_location(&self) -> String {
        self.location
            .clone()
            .or_else(|| std::env::var(env::VERTEX_LOCATION).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| defaults::DEFAULT_VERTEX_LOCATION.to_string())
    }

    /// Vertex project after applying environment fallbacks
    pub fn resolved_project_id(&self) -> Option<String> {
        self.project_id
            .clone()
            .or_else(|| std::env::var(env::VERTEX_PROJECT_ID).ok())
            .filter(|value| !value.trim().is_empty())
    }

    /// Base URL for model resources, e.g. `.../projects/p/locations/l/publishers/google`
    pub fn resolved_base_url(&self) -> String {
        if !self.base_url.trim().is_empty() {
            return self.base_url.trim_end_matches('/').to_string();
        }

        match self.endpoint {
            GeminiEndpoint::AiStudio => urls::GEMINI_API_BASE.to_string(),
            GeminiEndpoint::Vertex => {
                let location = self.resolved_location();
                let root = urls::VERTEX_API_BASE_TEMPLATE.replace("{location}", &location);
                match self.resolved_project_id() {
                    Some(project) => format!(
                        "{root}/projects/{project}/locations/{location}/publishers/google"
                    ),
                    None => format!("{root}/publishers/google"),
                }
            }
        }
    }
}

fn default_api_key_env() -> String {
    env::GEMINI_API_KEY.to_string()
}
fn default_access_token_env() -> String {
    env::VERTEX_ACCESS_TOKEN.to_string()
}
