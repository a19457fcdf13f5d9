//! AI provider configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API key.
    pub gemini_api_key: Option<String>,

    /// Model for chat turns.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model for structured visualization calls.
    #[serde(default = "default_structured_model")]
    pub structured_model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the AI section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.gemini_api_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingRequired("GEMINI_API_KEY")),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            chat_model: default_chat_model(),
            structured_model: default_structured_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    "learnlm-1.5-pro-experimental".to_string()
}

fn default_structured_model() -> String {
    "gemini-1.5-flash-8b".to_string()
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_learnlm_for_chat() {
        let config = AiConfig::default();
        assert_eq!(config.chat_model, "learnlm-1.5-pro-experimental");
        assert_eq!(config.structured_model, "gemini-1.5-flash-8b");
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn validation_requires_api_key() {
        assert!(AiConfig::default().validate().is_err());
        let config = AiConfig {
            gemini_api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
