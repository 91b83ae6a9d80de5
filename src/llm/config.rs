//! Provider selection and sampling settings from the environment

use super::{AnthropicService, LlmService, LoggingService, OpenAIService, Sampling};
use crate::config::{parse_var, ConfigError};
use std::fmt;
use std::sync::Arc;

/// Supported completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` or any server speaking its chat completions API
    OpenAI,
    Anthropic,
}

impl Provider {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "anthropic" => Some(Provider::Anthropic),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAI => f.write_str("openai"),
            Provider::Anthropic => f.write_str("anthropic"),
        }
    }
}

/// Configuration for the model participant and the summarizer
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub sampling: Sampling,
}

impl LlmConfig {
    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY");
        let anthropic_api_key = get("ANTHROPIC_API_KEY");

        let provider = match get("TANDEM_PROVIDER") {
            Some(value) => Provider::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                var: "TANDEM_PROVIDER".to_string(),
                value,
            })?,
            None if anthropic_api_key.is_some() && openai_api_key.is_none() => Provider::Anthropic,
            None => Provider::OpenAI,
        };

        let defaults = Sampling::default();
        let sampling = Sampling {
            max_tokens: parse_var("TANDEM_MAX_TOKENS", get("TANDEM_MAX_TOKENS"))?
                .unwrap_or(defaults.max_tokens),
            temperature: parse_var("TANDEM_TEMPERATURE", get("TANDEM_TEMPERATURE"))?
                .unwrap_or(defaults.temperature),
            top_p: parse_var("TANDEM_TOP_P", get("TANDEM_TOP_P"))?.unwrap_or(defaults.top_p),
        };

        Ok(Self {
            provider,
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            anthropic_api_key,
            model: get("TANDEM_MODEL"),
            sampling,
        })
    }

    /// Build the configured service, wrapped with logging
    pub fn build_service(&self) -> Result<Arc<dyn LlmService>, ConfigError> {
        let service: Arc<dyn LlmService> = match self.provider {
            Provider::OpenAI => {
                // A keyless base URL points at a local server
                if self.openai_api_key.is_none() && self.openai_base_url.is_none() {
                    return Err(ConfigError::MissingApiKey(self.provider));
                }
                let model = self.model.as_deref().unwrap_or(super::openai::DEFAULT_MODEL);
                Arc::new(OpenAIService::new(
                    self.openai_api_key.clone(),
                    model,
                    self.openai_base_url.as_deref(),
                )?)
            }
            Provider::Anthropic => {
                let key = self
                    .anthropic_api_key
                    .clone()
                    .ok_or(ConfigError::MissingApiKey(self.provider))?;
                let model = self.model.as_deref().unwrap_or(super::anthropic::DEFAULT_MODEL);
                Arc::new(AnthropicService::new(key, model)?)
            }
        };

        tracing::info!(provider = %self.provider, model = %service.model_id(), "LLM service configured");
        Ok(Arc::new(LoggingService::new(service)))
    }
}
