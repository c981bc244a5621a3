//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wardrobe backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where charts are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// One SVG file per device in `output_dir`
    Svg,
    /// One sparkline per update on stdout
    Terminal,
}

impl std::str::FromStr for Renderer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Renderer::Svg),
            "terminal" => Ok(Renderer::Terminal),
            other => Err(ConfigError::Invalid(format!("unknown renderer: {}", other))),
        }
    }
}

/// Chart polling and rendering
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_renderer")]
    pub renderer: Renderer,

    /// Mark charts whose last poll failed
    #[serde(default)]
    pub show_stale_badge: bool,
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

fn default_output_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("wardrobe-dashboard").join("charts").to_string_lossy().to_string())
        .unwrap_or_else(|| "./charts".to_string())
}

fn default_renderer() -> Renderer {
    Renderer::Svg
}

impl DashboardConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            output_dir: default_output_dir(),
            renderer: default_renderer(),
            show_stale_badge: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment.
    ///
    /// A config file that exists but cannot be read or parsed is an error;
    /// only a missing file falls back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("wardrobe-dashboard").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    fn load_first(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => {
                let config = Self::load_with_env(path)?;
                tracing::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => {
                tracing::info!("Using default config with environment overrides");
                Ok(Self::from_env())
            }
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("WARDROBE_API_URL") {
            self.api.base_url = url;
        }

        if let Some(interval) = lookup("WARDROBE_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(ms) => self.dashboard.poll_interval_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid WARDROBE_POLL_INTERVAL_MS: {}", interval),
            }
        }
        if let Some(dir) = lookup("WARDROBE_OUTPUT_DIR") {
            self.dashboard.output_dir = dir;
        }

        if let Some(level) = lookup("WARDROBE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WARDROBE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Wardrobe Dashboard Configuration
#
# Environment variables override these settings:
# - WARDROBE_API_URL
# - WARDROBE_POLL_INTERVAL_MS
# - WARDROBE_OUTPUT_DIR
# - WARDROBE_LOG_LEVEL
# - WARDROBE_LOG_FORMAT

[api]
# Wardrobe backend base URL
base_url = "http://localhost:8000"

# Request timeout in seconds
request_timeout_secs = 10

[dashboard]
# How often each device chart is refreshed (ms)
poll_interval_ms = 5000

# Directory for SVG charts (svg renderer only)
output_dir = "./charts"

# Renderer: svg or terminal
renderer = "svg"

# Mark charts whose last refresh failed as stale
show_stale_badge = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
