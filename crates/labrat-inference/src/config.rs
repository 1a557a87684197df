//! Vision backend configuration.
//!
//! Backends are configured from environment variables (a `.env` file is
//! loaded by the API binary before this runs):
//!
//! - `LABRAT_VISION_BACKEND` - default backend, `bedrock` or `openai`
//! - `BEDROCK_*` - primary backend, see [`BedrockConfig::from_env`]
//! - `OPENAI_*` - alternate backend, see [`OpenAIConfig::from_env`]
//!
//! The primary backend is always configured. The alternate backend is only
//! configured when it is the default or when `OPENAI_API_KEY` /
//! `OPENAI_BASE_URL` is present.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::{BedrockConfig, OpenAIConfig};
use labrat_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing configuration for default backend: {0}")]
    MissingBackend(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for labrat_core::Error {
    fn from(e: ConfigError) -> Self {
        labrat_core::Error::Config(e.to_string())
    }
}

/// Vision backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Bedrock Converse API.
    #[default]
    Bedrock,
    /// OpenAI-compatible chat completions.
    OpenAI,
}

impl BackendKind {
    /// Map a client `vision_model` selector to a backend.
    ///
    /// Accepts client nicknames and backend names. Unknown selectors yield `None`.
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector.trim().to_lowercase().as_str() {
            "claude" | "primary" | "bedrock" => Some(Self::Bedrock),
            "writer" | "alternate" | "openai" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "openai" => Ok(Self::OpenAI),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bedrock => write!(f, "bedrock"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// Which vision backends are configured and which one is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Backend used when a request has no (or an unusable) selector.
    pub default: BackendKind,
    /// Primary backend configuration.
    pub bedrock: Option<BedrockConfig>,
    /// Alternate backend configuration.
    pub openai: Option<OpenAIConfig>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            default: BackendKind::Bedrock,
            bedrock: Some(BedrockConfig::default()),
            openai: None,
        }
    }
}

impl VisionConfig {
    /// Load from environment variables.
    ///
    /// An unparsable `LABRAT_VISION_BACKEND` is an error.
    pub fn from_env() -> ConfigResult<Self> {
        let default = match env::var(defaults::ENV_VISION_BACKEND) {
            Ok(value) if !value.trim().is_empty() => value.trim().parse()?,
            _ => BackendKind::default(),
        };

        let openai_requested = default == BackendKind::OpenAI
            || env::var("OPENAI_API_KEY").is_ok()
            || env::var("OPENAI_BASE_URL").is_ok();

        let config = Self {
            default,
            bedrock: Some(BedrockConfig::from_env()),
            openai: openai_requested.then(OpenAIConfig::from_env),
        };

        info!(
            subsystem = "inference",
            default = %config.default,
            backends = ?config.available_backends(),
            "Vision backends configured"
        );

        Ok(config)
    }

    /// Get the list of available (configured) backends.
    pub fn available_backends(&self) -> Vec<BackendKind> {
        let mut backends = Vec::new();
        if self.bedrock.is_some() {
            backends.push(BackendKind::Bedrock);
        }
        if self.openai.is_some() {
            backends.push(BackendKind::OpenAI);
        }
        backends
    }

    /// Validate every configured backend and the default selection.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.available_backends().contains(&self.default) {
            return Err(ConfigError::MissingBackend(self.default.to_string()));
        }
        if let Some(ref bedrock) = self.bedrock {
            bedrock.validate()?;
        }
        if let Some(ref openai) = self.openai {
            openai.validate()?;
        }
        debug!("Vision configuration validated");
        Ok(())
    }
}

/// Basic URL validation shared by backend configs.
pub(crate) fn validate_url(label: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", label)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            label, url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("bedrock".parse::<BackendKind>().unwrap(), BackendKind::Bedrock);
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAI);
        assert!(matches!(
            "ollama".parse::<BackendKind>(),
            Err(ConfigError::InvalidBackend(_))
        ));
    }

    #[test]
    fn test_backend_kind_display_round_trips() {
        for kind in [BackendKind::Bedrock, BackendKind::OpenAI] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_selector_mapping() {
        assert_eq!(BackendKind::from_selector("claude"), Some(BackendKind::Bedrock));
        assert_eq!(BackendKind::from_selector("Primary"), Some(BackendKind::Bedrock));
        assert_eq!(BackendKind::from_selector("writer"), Some(BackendKind::OpenAI));
        assert_eq!(BackendKind::from_selector(" alternate "), Some(BackendKind::OpenAI));
        assert_eq!(BackendKind::from_selector("llava"), None);
        assert_eq!(BackendKind::from_selector(""), None);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = VisionConfig::default();
        assert_eq!(config.available_backends(), vec![BackendKind::Bedrock]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unconfigured_default() {
        let config = VisionConfig {
            default: BackendKind::OpenAI,
            bedrock: Some(BedrockConfig::default()),
            openai: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBackend(name)) if name == "openai"
        ));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://example.com").is_ok());
        assert!(validate_url("base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_config_error_into_core_error() {
        let err: labrat_core::Error = ConfigError::InvalidBackend("x".to_string()).into();
        assert!(matches!(err, labrat_core::Error::Config(_)));
        assert!(err.to_string().contains("Invalid backend: x"));
    }
}
