//! Configuration management for ReviewLens
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, ReviewLensError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure for ReviewLens
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Conversation behavior settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend connection configuration
///
/// Review collection scrapes live product pages and can take minutes, so it
/// runs under its own, longer timeout than the chat calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the ReviewLens backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for session, message, and lookup calls (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Timeout for review collection and analysis calls (seconds)
    #[serde(default = "default_collect_timeout")]
    pub collect_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_collect_timeout() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            collect_timeout_seconds: default_collect_timeout(),
        }
    }
}

/// Conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum reviews requested when collecting from a URL
    #[serde(default = "default_max_reviews")]
    pub max_reviews: u32,

    /// Number of reviews requested per regret factor lookup
    #[serde(default = "default_factor_review_limit")]
    pub factor_review_limit: u32,

    /// Vendor sent with collection requests when the URL host is unknown
    #[serde(default = "default_vendor")]
    pub default_vendor: String,

    /// Category used when a session must be created without one
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Pause before rendering analysis results (milliseconds)
    #[serde(default = "default_analysis_pause")]
    pub analysis_pause_ms: u64,

    /// Pause before rendering a failure (milliseconds)
    #[serde(default = "default_error_pause")]
    pub error_pause_ms: u64,

    /// Forces product-picker mode on or off regardless of backend config
    #[serde(default)]
    pub product_selection: Option<bool>,

    /// Display names for summarization strategies
    #[serde(default)]
    pub strategy_names: HashMap<String, String>,
}

fn default_max_reviews() -> u32 {
    100
}

fn default_factor_review_limit() -> u32 {
    5
}

fn default_vendor() -> String {
    "smartstore".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

fn default_analysis_pause() -> u64 {
    800
}

fn default_error_pause() -> u64 {
    1000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_reviews: default_max_reviews(),
            factor_review_limit: default_factor_review_limit(),
            default_vendor: default_vendor(),
            default_category: default_category(),
            analysis_pause_ms: default_analysis_pause(),
            error_pause_ms: default_error_pause(),
            product_selection: None,
            strategy_names: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ReviewLensError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ReviewLensError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("REVIEWLENS_API_URL") {
            tracing::debug!(base_url = %base_url, "Env override: REVIEWLENS_API_URL");
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("REVIEWLENS_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid REVIEWLENS_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("REVIEWLENS_COLLECT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.collect_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid REVIEWLENS_COLLECT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(max_reviews) = std::env::var("REVIEWLENS_MAX_REVIEWS") {
            if let Ok(value) = max_reviews.parse() {
                self.chat.max_reviews = value;
            } else {
                tracing::warn!("Invalid REVIEWLENS_MAX_REVIEWS: {}", max_reviews);
            }
        }

        if let Ok(selection) = std::env::var("REVIEWLENS_PRODUCT_SELECTION") {
            match selection.parse::<bool>() {
                Ok(v) => {
                    self.chat.product_selection = Some(v);
                    tracing::debug!(
                        product_selection = v,
                        "Env override: REVIEWLENS_PRODUCT_SELECTION"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for REVIEWLENS_PRODUCT_SELECTION: {}",
                        selection
                    );
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ReviewLensError::Config("api.base_url cannot be empty".to_string()).into());
        }

        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            ReviewLensError::Config(format!(
                "api.base_url is not a valid URL ({}): {}",
                self.api.base_url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ReviewLensError::Config(format!(
                "api.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(ReviewLensError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.collect_timeout_seconds < self.api.request_timeout_seconds {
            return Err(ReviewLensError::Config(
                "api.collect_timeout_seconds must not be shorter than api.request_timeout_seconds"
                    .to_string(),
            )
            .into());
        }

        if self.chat.max_reviews == 0 {
            return Err(
                ReviewLensError::Config("chat.max_reviews must be greater than 0".to_string())
                    .into(),
            );
        }

        if self.chat.factor_review_limit == 0 {
            return Err(ReviewLensError::Config(
                "chat.factor_review_limit must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
