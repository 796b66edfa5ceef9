// src/config.rs
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::errors::DesignerError;
use crate::models::ModelTier;

/// Value shipped in `.env.example`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "sk-or-...";

#[derive(Debug, Clone)]
pub struct Settings {
    pub claude_binary: String,
    pub claude_model: ModelTier,
    pub claude_timeout: Duration,
    pub openrouter_api_key: Option<String>,
    pub openrouter_image_model: String,
    pub openrouter_base_url: String,
    pub output_dir: PathBuf,
    pub max_image_dimension: u32,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            claude_binary: "claude".to_string(),
            claude_model: ModelTier::Sonnet,
            claude_timeout: Duration::from_secs(300),
            openrouter_api_key: None,
            openrouter_image_model: "sourceful/riverflow-v2-fast-preview".to_string(),
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            output_dir: PathBuf::from("./output"),
            max_image_dimension: 1024,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    /// Load from the process environment, honouring a `.env` file if present.
    pub fn from_env() -> Result<Self, DesignerError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DesignerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let claude_model = match get("CLAUDE_MODEL") {
            Some(raw) => ModelTier::from_str(&raw).map_err(DesignerError::Config)?,
            None => defaults.claude_model,
        };

        let claude_timeout = match get("CLAUDE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("CLAUDE_TIMEOUT_SECS", &raw)?),
            None => defaults.claude_timeout,
        };

        let max_image_dimension = match get("MAX_IMAGE_DIMENSION") {
            Some(raw) => parse_number("MAX_IMAGE_DIMENSION", &raw)?,
            None => defaults.max_image_dimension,
        };

        Ok(Self {
            claude_binary: get("CLAUDE_BINARY").unwrap_or(defaults.claude_binary),
            claude_model,
            claude_timeout,
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_image_model: get("OPENROUTER_IMAGE_MODEL")
                .unwrap_or(defaults.openrouter_image_model),
            openrouter_base_url: get("OPENROUTER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openrouter_base_url),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_image_dimension,
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }

    /// True when an image-generation credential is configured.
    pub fn has_image_credentials(&self) -> bool {
        self.openrouter_api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, DesignerError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| DesignerError::Config(format!("{} must be a positive number, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, DesignerError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.claude_binary, "claude");
        assert_eq!(settings.claude_model, ModelTier::Sonnet);
        assert_eq!(settings.claude_timeout, Duration::from_secs(300));
        assert_eq!(settings.output_dir, PathBuf::from("./output"));
        assert!(!settings.has_image_credentials());
    }

    #[test]
    fn empty_values_are_ignored() {
        let settings = settings_from(&[("CLAUDE_MODEL", ""), ("OPENROUTER_API_KEY", "  ")]).unwrap();
        assert_eq!(settings.claude_model, ModelTier::Sonnet);
        assert!(settings.openrouter_api_key.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let settings = settings_from(&[
            ("CLAUDE_MODEL", "opus"),
            ("CLAUDE_TIMEOUT_SECS", "60"),
            ("OPENROUTER_API_KEY", "sk-or-real"),
            ("OPENROUTER_BASE_URL", "http://localhost:9000/v1/"),
            ("OUTPUT_DIR", "/tmp/designs"),
        ])
        .unwrap();
        assert_eq!(settings.claude_model, ModelTier::Opus);
        assert_eq!(settings.claude_timeout, Duration::from_secs(60));
        assert_eq!(settings.openrouter_base_url, "http://localhost:9000/v1");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/designs"));
        assert!(settings.has_image_credentials());
    }

    #[test]
    fn placeholder_key_is_not_a_credential() {
        let settings = settings_from(&[("OPENROUTER_API_KEY", PLACEHOLDER_API_KEY)]).unwrap();
        assert!(!settings.has_image_credentials());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            settings_from(&[("CLAUDE_MODEL", "gpt")]),
            Err(DesignerError::Config(_))
        ));
        assert!(matches!(
            settings_from(&[("CLAUDE_TIMEOUT_SECS", "soon")]),
            Err(DesignerError::Config(_))
        ));
    }
}
