use super::providers::GeminiProvider;
use crate::config::constants::models;
use crate::config::loader::HarnessConfig;
use crate::core::driver::{ConversationDriver, DriverConfig, EpisodeEngine};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use tracing::warn;

type EngineBuilder = Box<dyn Fn(&str, &HarnessConfig) -> Result<Box<dyn EpisodeEngine>> + Send + Sync>;

/// Provider registry: maps a provider name to a builder of episode engines
pub struct ProviderFactory {
    providers: HashMap<String, EngineBuilder>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        let mut factory = Self {
            providers: HashMap::new(),
        };

        // Register built-in providers
        factory.register_provider("gemini", |model, config| {
            let provider = GeminiProvider::from_config(model, config)?;
            Ok(Box::new(ConversationDriver::new(
                provider,
                DriverConfig::from(&config.agent),
            )) as Box<dyn EpisodeEngine>)
        });

        factory
    }

    /// Register a new provider
    pub fn register_provider<F>(&mut self, name: &str, builder: F)
    where
        F: Fn(&str, &HarnessConfig) -> Result<Box<dyn EpisodeEngine>> + Send + Sync + 'static,
    {
        self.providers.insert(name.to_string(), Box::new(builder));
    }

    /// Create an engine for `model` served by `provider_name`
    pub fn create_engine(
        &self,
        provider_name: &str,
        model: &str,
        config: &HarnessConfig,
    ) -> Result<Box<dyn EpisodeEngine>> {
        let builder = self
            .providers
            .get(provider_name)
            .ok_or_else(|| anyhow!("Unknown provider: {provider_name}"))?;
        builder(model, config)
    }

    /// List available providers
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `model` is one of the names the provider is known to serve
    pub fn is_known_model(&self, provider_name: &str, model: &str) -> bool {
        match provider_name {
            "gemini" => models::google::SUPPORTED_MODELS.contains(&model),
            _ => false,
        }
    }

    /// Determine provider name from model string
    pub fn provider_from_model(&self, model: &str) -> Option<String> {
        let m = model.to_lowercase();
        if m.contains("gemini") {
            Some("gemini".to_string())
        } else {
            None
        }
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Create an engine for `model`, inferring the provider from the model name and
/// falling back to the configured provider
pub fn create_engine(model: &str, config: &HarnessConfig) -> Result<Box<dyn EpisodeEngine>> {
    let factory = ProviderFactory::new();
    let provider = factory
        .provider_from_model(model)
        .unwrap_or_else(|| config.agent.provider.clone());
    if !factory.is_known_model(&provider, model) {
        warn!(provider = %provider, model, "model is not in the supported list; continuing anyway");
    }
    factory.create_engine(&provider, model, config)
}
