use crate::config::constants::defaults;
use crate::config::core::{AgentConfig, GeminiConfig, HttpConfig, RetrySettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure loaded from `harness.toml`
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HarnessConfig {
    /// Run-wide settings (model, temperature, step limit, concurrency)
    #[serde(default)]
    pub agent: AgentConfig,

    /// Gemini / Vertex AI settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Backoff policy for vendor calls
    #[serde(default)]
    pub retry: RetrySettings,

    /// HTTP connection settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl HarnessConfig {
    /// Write a default configuration file
    pub fn create_sample_config<P: AsRef<Path>>(output: P) -> Result<()> {
        let output = output.as_ref();
        let default_config = HarnessConfig::default();
        let config_content = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default configuration")?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(output, config_content)
            .with_context(|| format!("Failed to write config file: {}", output.display()))?;

        Ok(())
    }
}

/// Configuration manager for loading configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: HarnessConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Get the user's home directory path
    fn get_home_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            return Some(PathBuf::from(home));
        }

        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(userprofile));
        }

        dirs::home_dir()
    }

    /// Load configuration from a specific workspace
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let workspace = workspace.as_ref();

        // harness.toml in workspace root first
        let config_path = workspace.join(defaults::CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }

        let fallback_path = workspace
            .join(defaults::CONFIG_DIR_NAME)
            .join(defaults::CONFIG_FILE_NAME);
        if fallback_path.exists() {
            return Self::load_from_file(&fallback_path);
        }

        if let Some(home_dir) = Self::get_home_dir() {
            let home_config_path = home_dir
                .join(defaults::CONFIG_DIR_NAME)
                .join(defaults::CONFIG_FILE_NAME);
            if home_config_path.exists() {
                return Self::load_from_file(&home_config_path);
            }
        }

        debug!(workspace = %workspace.display(), "no harness.toml found, using defaults");
        Ok(Self {
            config: HarnessConfig::default(),
            config_path: None,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: HarnessConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "loaded configuration");
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Consume the manager and return the configuration
    pub fn into_config(self) -> HarnessConfig {
        self.config
    }

    /// Get the configuration file path (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::core::GeminiEndpoint;
    use tempfile::TempDir;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join(defaults::CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[agent]
model = "gemini-2.5-pro-FC"
max_steps = 5

[gemini]
endpoint = "ai_studio"

[retry]
max_attempts = 2
"#,
        )
        .expect("write config");

        let manager = ConfigManager::load_from_workspace(dir.path()).expect("load");
        let config = manager.config();
        assert_eq!(config.agent.model, "gemini-2.5-pro-FC");
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.agent.concurrency, defaults::DEFAULT_CONCURRENCY);
        assert_eq!(config.gemini.endpoint, GeminiEndpoint::AiStudio);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(manager.config_path(), Some(path.as_path()));
    }

    #[test]
    fn sample_config_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join(defaults::CONFIG_FILE_NAME);
        HarnessConfig::create_sample_config(&path).expect("write sample");

        let manager = ConfigManager::load_from_file(&path).expect("load sample");
        assert_eq!(manager.config().agent.max_steps, defaults::DEFAULT_MAX_STEPS);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join(defaults::CONFIG_FILE_NAME);
        fs::write(&path, "[agent\nmodel = ").expect("write config");

        let err = ConfigManager::load_from_file(&path).expect_err("parse failure");
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
