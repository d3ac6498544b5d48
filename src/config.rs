//! Generator configuration.
//!
//! Handles loading, validating, and merging `pagesmith.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; command-line flags are
//! applied on top of the merged result by the CLI.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! content_model = "gemini-2.5-flash"
//! image_model = "gemini-2.5-flash-image"
//! api_key_env = "GEMINI_API_KEY"   # Environment variable holding the key
//! timeout_secs = 120
//!
//! [images]
//! count = 3                # Image prompts to illustrate (0-3)
//! delay_ms = 5000          # Pause before every image request after the first
//!
//! [site]
//! redirect_url = "https://byvn.net/mwYb"
//! language = "zh-CN"
//! keywords = ["资源分享", "在线阅读"]
//! copyright_holder = "Generated via AI Site Generator"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [images]
//! delay_ms = 12000
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILENAME: &str = "pagesmith.toml";

/// The content schema asks for this many image prompts; asking to
/// illustrate more than that can never be satisfied.
pub const MAX_IMAGES: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `pagesmith.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Generative service endpoint, models and credentials.
    pub api: ApiConfig,
    /// Illustration loop settings.
    pub images: ImagesConfig,
    /// Values baked into the generated site.
    pub site: SiteConfig,
}

impl GeneratorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.count > MAX_IMAGES {
            return Err(ConfigError::Validation(format!(
                "images.count must be 0-{MAX_IMAGES}"
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be non-zero".into(),
            ));
        }
        if self.api.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.endpoint must not be empty".into(),
            ));
        }
        if self.api.content_model.trim().is_empty() || self.api.image_model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.content_model and api.image_model must not be empty".into(),
            ));
        }
        if self.api.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.api_key_env must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Generative service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL up to and including the API version.
    pub endpoint: String,
    /// Model producing the structured article.
    pub content_model: String,
    /// Model producing illustrations as inline image data.
    pub image_model: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            content_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Illustration loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// How many of the returned image prompts to illustrate.
    pub count: usize,
    /// Fixed pause before every image request except the first, in
    /// milliseconds. Tuned for free-tier quotas.
    pub delay_ms: u64,
}

impl ImagesConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            count: MAX_IMAGES,
            delay_ms: 5000,
        }
    }
}

/// Values baked into the generated site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Redirect target used when none is given on the command line.
    pub redirect_url: String,
    /// `lang` attribute of the generated page.
    pub language: String,
    /// Extra `<meta name="keywords">` entries after the topic.
    pub keywords: Vec<String>,
    /// Copyright line of the bundled MIT license.
    pub copyright_holder: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            redirect_url: "https://byvn.net/mwYb".to_string(),
            language: "zh-CN".to_string(),
            keywords: vec!["资源分享".to_string(), "在线阅读".to_string()],
            copyright_holder: "Generated via AI Site Generator".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GeneratorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `pagesmith.toml` from a directory, falling back to stock defaults
/// when the file does not exist.
pub fn load_config(dir: &Path) -> Result<GeneratorConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `pagesmith.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pagesmith Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Generative service
# ---------------------------------------------------------------------------
[api]
# Base URL up to and including the API version.
endpoint = "https://generativelanguage.googleapis.com/v1beta"

# Model that writes the structured article.
content_model = "gemini-2.5-flash"

# Model that draws the illustrations.
image_model = "gemini-2.5-flash-image"

# Environment variable the API key is read from.
api_key_env = "GEMINI_API_KEY"

# Per-request timeout in seconds.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Illustrations
# ---------------------------------------------------------------------------
[images]
# How many image prompts to illustrate (0-3).
count = 3

# Pause before every image request after the first, in milliseconds.
# Free-tier quotas reject bursts; raise this if images keep failing.
delay_ms = 5000

# ---------------------------------------------------------------------------
# Generated site
# ---------------------------------------------------------------------------
[site]
# Where the generated page redirects to when --redirect is not given.
redirect_url = "https://byvn.net/mwYb"

# <html lang> of the generated page.
language = "zh-CN"

# Keywords listed after the topic in <meta name="keywords">.
keywords = ["资源分享", "在线阅读"]

# Copyright line of the bundled MIT license.
copyright_holder = "Generated via AI Site Generator"
"##
}
