//! Configuration management for escapadas
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::EscapadasError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscapadasConfig {
    /// Chat-completions model used for intake, itinerary, audit and contacts
    pub text_model: TextModelConfig,
    /// Image model used for the map and the flyer
    pub image_model: ImageModelConfig,
    pub pricing: PricingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// OpenAI-compatible text model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextModelConfig {
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures, 0 disables retrying
    pub max_retries: u32,
}

/// Gemini image model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageModelConfig {
    /// Falls back to `GOOGLE_API_KEY` when unset
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
}

/// Prices used by the usage ledger, in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub input_usd_per_token: f64,
    pub output_usd_per_token: f64,
    pub image_usd: f64,
}

/// Where artifacts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name prefix of generated images
    pub image_prefix: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_text_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_text_timeout() -> u32 {
    60
}

fn default_image_timeout() -> u32 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_image_prefix() -> String {
    "escapada".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TextModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_text_base_url(),
            model: default_text_model(),
            timeout_seconds: default_text_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ImageModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_image_base_url(),
            model: default_image_model(),
            timeout_seconds: default_image_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_usd_per_token: 0.000_000_15,
            output_usd_per_token: 0.000_000_6,
            image_usd: 0.04,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            image_prefix: default_image_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl EscapadasConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ESCAPADAS_TEXT_MODEL__MODEL=gpt-4o overrides text_model.model
        builder = builder.add_source(
            Environment::with_prefix("ESCAPADAS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EscapadasConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("escapadas").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.text_model.base_url.is_empty() {
            self.text_model.base_url = default_text_base_url();
        }
        if self.text_model.model.is_empty() {
            self.text_model.model = default_text_model();
        }
        if self.text_model.timeout_seconds == 0 {
            self.text_model.timeout_seconds = default_text_timeout();
        }
        if self.image_model.base_url.is_empty() {
            self.image_model.base_url = default_image_base_url();
        }
        if self.image_model.model.is_empty() {
            self.image_model.model = default_image_model();
        }
        if self.image_model.timeout_seconds == 0 {
            self.image_model.timeout_seconds = default_image_timeout();
        }
        if self.output.directory.as_os_str().is_empty() {
            self.output.directory = default_output_directory();
        }
        if self.output.image_prefix.is_empty() {
            self.output.image_prefix = default_image_prefix();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional here, the clients fall back to the environment
    pub fn validate_api_keys(&self) -> Result<()> {
        for (section, key) in [
            ("text_model", &self.text_model.api_key),
            ("image_model", &self.image_model.api_key),
        ] {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(EscapadasError::config(format!(
                        "{section}.api_key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (section, timeout, retries) in [
            (
                "text_model",
                self.text_model.timeout_seconds,
                self.text_model.max_retries,
            ),
            (
                "image_model",
                self.image_model.timeout_seconds,
                self.image_model.max_retries,
            ),
        ] {
            if timeout > 600 {
                return Err(EscapadasError::config(format!(
                    "{section} timeout cannot exceed 600 seconds"
                ))
                .into());
            }
            if retries > 10 {
                return Err(
                    EscapadasError::config(format!("{section} max retries cannot exceed 10")).into(),
                );
            }
        }

        let pricing = &self.pricing;
        if [
            pricing.input_usd_per_token,
            pricing.output_usd_per_token,
            pricing.image_usd,
        ]
        .iter()
        .any(|price| !price.is_finite() || *price < 0.0)
        {
            return Err(EscapadasError::config("Prices must be finite and non-negative").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EscapadasError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EscapadasError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (section, url) in [
            ("text_model", &self.text_model.base_url),
            ("image_model", &self.image_model.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EscapadasError::config(format!(
                    "{section} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self
            .output
            .image_prefix
            .contains(|c: char| std::path::is_separator(c))
        {
            return Err(
                EscapadasError::config("Image prefix cannot contain path separators").into(),
            );
        }

        Ok(())
    }
}
