//! Configuration management for CemtrAS
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::attachments::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::error::{CemtrasError, Result};
use crate::history::DEFAULT_MAX_HISTORIES;
use crate::roles::Role;
use crate::session::DEFAULT_MAX_MESSAGE_CHARS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for CemtrAS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chat session limits and defaults
    #[serde(default)]
    pub chat: ChatConfig,
    /// Chat history retention
    #[serde(default)]
    pub history: HistoryConfig,
    /// Local storage location
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; usually supplied through `GEMINI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API (overridable for tests)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Sampling parameters sent with every request
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            generation: GenerationConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// The API key if one is set and non-blank
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling probability mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Top-k sampling cutoff
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Maximum tokens in a response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.8
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Persona selected when a session starts
    #[serde(default)]
    pub default_role: Role,

    /// Maximum message length in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Maximum size of one attachment in bytes
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

fn default_max_message_chars() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}

fn default_max_attachment_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_role: Role::default(),
            max_message_chars: default_max_message_chars(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

/// Chat history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of saved conversations
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    DEFAULT_MAX_HISTORIES
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database location; the platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CemtrasError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CemtrasError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        // The prefixed name wins when both are set.
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("CEMTRAS_GEMINI_API_KEY") {
            self.provider.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("CEMTRAS_MODEL") {
            self.provider.model = model;
        }

        if let Ok(api_base) = std::env::var("CEMTRAS_API_BASE") {
            tracing::debug!(api_base = %api_base, "Env override: CEMTRAS_API_BASE");
            self.provider.api_base = api_base;
        }

        if let Ok(role) = std::env::var("CEMTRAS_DEFAULT_ROLE") {
            match Role::parse_str(&role) {
                Ok(r) => self.chat.default_role = r,
                Err(_) => tracing::warn!("Invalid CEMTRAS_DEFAULT_ROLE: {}", role),
            }
        }

        if let Ok(max) = std::env::var("CEMTRAS_MAX_HISTORIES") {
            if let Ok(value) = max.parse() {
                self.history.max_records = value;
            } else {
                tracing::warn!("Invalid CEMTRAS_MAX_HISTORIES: {}", max);
            }
        }

        if let Ok(path) = std::env::var("CEMTRAS_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges.
    /// A missing API key is not a validation failure: it only blocks sends.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.trim().is_empty() {
            return Err(CemtrasError::Config("provider.model cannot be empty".to_string()).into());
        }

        if self.provider.api_base.trim().is_empty() {
            return Err(
                CemtrasError::Config("provider.api_base cannot be empty".to_string()).into(),
            );
        }

        if self.provider.timeout_seconds == 0 {
            return Err(CemtrasError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let generation = &self.provider.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(CemtrasError::Config(
                "provider.generation.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if generation.top_p <= 0.0 || generation.top_p > 1.0 {
            return Err(CemtrasError::Config(
                "provider.generation.top_p must be between 0.0 and 1.0".to_string(),
            )
            .into());
        }

        if generation.top_k == 0 {
            return Err(CemtrasError::Config(
                "provider.generation.top_k must be greater than 0".to_string(),
            )
            .into());
        }

        if generation.max_output_tokens == 0 {
            return Err(CemtrasError::Config(
                "provider.generation.max_output_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_message_chars == 0 {
            return Err(CemtrasError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_attachment_bytes == 0 {
            return Err(CemtrasError::Config(
                "chat.max_attachment_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.max_records == 0 {
            return Err(CemtrasError::Config(
                "history.max_records must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
