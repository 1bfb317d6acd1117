use crate::gemini::ClientConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP connection settings for vendor clients
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl From<&HttpConfig> for ClientConfig {
    fn from(http: &HttpConfig) -> Self {
        Self {
            pool_max_idle_per_host: http.pool_max_idle_per_host,
            pool_idle_timeout: Duration::from_secs(http.pool_idle_timeout_secs),
            connect_timeout: Duration::from_secs(http.connect_timeout_secs),
            user_agent: http.user_agent.clone(),
            ..ClientConfig::default()
        }
    }
}

fn default_pool_max_idle_per_host() -> usize {
    10
}
fn default_pool_idle_timeout_secs() -> u64 {
    90
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    concat!("fc-harness/", env!("CARGO_PKG_VERSION")).to_string()
}
