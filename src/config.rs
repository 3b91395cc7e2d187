use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Vigil";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default generator prompt length in characters.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 2_000;
/// Characters of redacted query kept in analytics and provider summaries.
pub const DEFAULT_EXCERPT_CHARS: usize = 160;

pub const ENV_REGION: &str = "VIGIL_REGION";
pub const ENV_RED_FLAGS: &str = "VIGIL_RED_FLAGS";
pub const ENV_MAX_INPUT: &str = "VIGIL_MAX_INPUT";
pub const ENV_ANALYTICS: &str = "VIGIL_ANALYTICS";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "vigil_lib=info,vigil=info,warn"
}

/// Get the application data directory
/// ~/Vigil/ on all platforms
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default red-flag configuration file, consulted only when it exists.
pub fn default_red_flag_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("red_flags.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Red-flag file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Red-flag list is empty")]
    EmptyRedFlags,

    #[error("Invalid red flag: {0}")]
    InvalidRedFlag(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime settings for the safety layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Region used when a request carries none.
    pub default_region: String,
    /// Explicit red-flag file. `None` means default location or built-in.
    pub red_flag_path: Option<PathBuf>,
    /// Generator prompts are capped at this many characters on a word
    /// boundary. Matching always sees the full query.
    pub max_input_length: usize,
    pub analytics_enabled: bool,
    pub excerpt_chars: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            default_region: "US".to_string(),
            red_flag_path: None,
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            analytics_enabled: true,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

impl SafetyConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup (env in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(region) = lookup(ENV_REGION).filter(|r| !r.trim().is_empty()) {
            config.default_region = region.trim().to_ascii_uppercase();
        }

        if let Some(path) = lookup(ENV_RED_FLAGS).filter(|p| !p.trim().is_empty()) {
            config.red_flag_path = Some(PathBuf::from(path.trim()));
        }

        if let Some(raw) = lookup(ENV_MAX_INPUT) {
            let parsed = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_MAX_INPUT,
                    value: raw.clone(),
                })?;
            config.max_input_length = parsed;
        }

        if let Some(raw) = lookup(ENV_ANALYTICS) {
            config.analytics_enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_ANALYTICS,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}
