use crate::error::{Result, TutorError};
use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct SnowfallConfig {
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// OpenAI-compatible API root, e.g. `https://api.groq.com/openai/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as a bearer token when present
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Connect and idle-read timeout; also the total timeout of non-streaming calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join a path onto the base URL without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl SnowfallConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("SNOWFALL_BASE_URL").unwrap_or_else(|_| default_base_url());
        let api_key = env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        let default_model = env::var("SNOWFALL_MODEL").unwrap_or_else(|_| default_model());

        let timeout_secs = match env::var("SNOWFALL_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| TutorError::ConfigError(format!("Invalid timeout value: {}", e)))?,
            Err(_) => default_timeout_secs(),
        };

        Ok(SnowfallConfig {
            api: ApiConfig {
                base_url,
                api_key,
                default_model,
                timeout_secs,
            },
        })
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| TutorError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&contents)?;

        // Allow environment variables to override file config
        if let Ok(api_key) = env::var("GROQ_API_KEY")
            && !api_key.is_empty()
        {
            config.api.api_key = Some(api_key);
        }

        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| TutorError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(TutorError::ConfigError("Base URL is empty".to_string()));
        }

        if self.api.default_model.is_empty() {
            return Err(TutorError::ConfigError("Default model is empty".to_string()));
        }

        if self.api.timeout_secs == 0 {
            return Err(TutorError::ConfigError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
