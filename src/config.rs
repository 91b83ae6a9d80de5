//! Startup configuration read from the environment

use crate::llm::{LlmConfig, LlmError, Provider};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_PYTHON: &str = "python3";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: String, value: String },
    #[error("no credentials configured for the {0} provider")]
    MissingApiKey(Provider),
    #[error("failed to create LLM service: {0}")]
    Service(#[from] LlmError),
}

/// Who sits in a conversation seat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// A human at the terminal
    Console,
    /// A remote language model
    Model,
}

impl ParticipantKind {
    fn parse(var: &str, value: Option<String>, default: Self) -> Result<Self, ConfigError> {
        let Some(value) = value else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "console" => Ok(ParticipantKind::Console),
            "model" => Ok(ParticipantKind::Model),
            _ => Err(ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub participants: [ParticipantKind; 2],
    /// FILE_MANAGER start directory
    pub working_dir: PathBuf,
    /// Give the web tools a model summarizer
    pub summarize: bool,
    /// Interpreter used by the PYTHON tool
    pub python: String,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let first = ParticipantKind::parse(
            "TANDEM_PARTICIPANT_1",
            get("TANDEM_PARTICIPANT_1"),
            ParticipantKind::Console,
        )?;
        let second = ParticipantKind::parse(
            "TANDEM_PARTICIPANT_2",
            get("TANDEM_PARTICIPANT_2"),
            ParticipantKind::Model,
        )?;

        let summarize = match get("TANDEM_SUMMARIZE") {
            None => false,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "TANDEM_SUMMARIZE".to_string(),
                        value,
                    })
                }
            },
        };

        Ok(Self {
            participants: [first, second],
            working_dir: get("TANDEM_WORKING_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from),
            summarize,
            python: get("TANDEM_PYTHON").unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            llm: LlmConfig::from_lookup(&lookup)?,
        })
    }
}

/// Parse an optional variable, naming it in the error
pub(crate) fn parse_var<T: FromStr>(var: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: v,
            })
        })
        .transpose()
}
