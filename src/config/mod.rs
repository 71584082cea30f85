//! Configuration for the Gemini chat client
//!
//! Values are layered, lowest priority first:
//! 1. Config file (`<config_dir>/gemini-chat/config.toml`, or `--config`)
//! 2. Environment variables (`GEMINI_API_KEY`, also read from `.env`)
//! 3. CLI parameters

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default Gemini REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model identifier, e.g. `gemini-2.5-flash` or `models/gemini-2.5-flash`
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; requests are sent unauthenticated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API root, without the version segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling parameters forwarded as `generationConfig`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationOptions>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            generation: None,
        }
    }
}

/// Generation parameters, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationOptions {
    /// True when no parameter is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl GeminiConfig {
    /// Create a configuration for `model` with an explicit API key
    #[must_use]
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            ..Self::default()
        }
    }

    /// Create a configuration for `model`, taking the API key from the environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    #[must_use]
    pub fn from_env(model: impl Into<String>) -> Self {
        Self::new(model, None).with_env()
    }

    /// Fill the API key from the environment, overriding any configured one
    #[must_use]
    pub fn with_env(mut self) -> Self {
        dotenv::dotenv().ok();
        if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Model path segment as Gemini expects it (`models/<name>`)
    #[must_use]
    pub fn model_path(&self) -> String {
        if self.model.starts_with("models/") || self.model.starts_with("tunedModels/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// Get the configuration directory path
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gemini-chat")
    }

    /// Get the default config file path
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ClientError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ClientError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_paths() {
        let path = GeminiConfig::default_config_path();
        assert!(path.ends_with("gemini-chat/config.toml"));
    }

    #[test]
    fn test_model_path() {
        let config = GeminiConfig::new("gemini-2.5-flash", None);
        assert_eq!(config.model_path(), "models/gemini-2.5-flash");

        let config = config.with_model("models/gemini-2.5-pro");
        assert_eq!(config.model_path(), "models/gemini-2.5-pro");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeminiConfig::load_from_path(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, GeminiConfig::default());
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "gemini-2.5-pro"
api_key = "abc"

[generation]
temperature = 0.5
max_output_tokens = 256
"#
        )
        .unwrap();

        let config = GeminiConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let generation = config.generation.unwrap();
        assert_eq!(generation.temperature, Some(0.5));
        assert_eq!(generation.max_output_tokens, Some(256));
        assert!(generation.stop_sequences.is_none());
    }

    #[test]
    fn test_generation_keys_are_snake_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\ntop_k = 40\nmaxOutputTokens = 99").unwrap();

        let generation = GeminiConfig::load_from_path(file.path())
            .unwrap()
            .generation
            .unwrap();
        assert_eq!(generation.top_k, Some(40));
        assert_eq!(generation.max_output_tokens, None);
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeminiConfig::load_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, ClientError::ConfigParse { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = [").unwrap();

        let err = GeminiConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::ConfigParse { .. }));
    }

    #[test]
    fn test_generation_is_empty() {
        assert!(GenerationOptions::default().is_empty());
        let options = GenerationOptions {
            top_k: Some(40),
            ..GenerationOptions::default()
        };
        assert!(!options.is_empty());
    }
}
