use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Runtime configuration for the engine and its AI collaborator.
///
/// Defaults first, then an optional TOML file, then `BANNERKIT_*` environment
/// overrides; later layers win.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct HistoryConfig {
    pub retention_cap: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 30,
            },
            history: HistoryConfig { retention_cap: 50 },
            logging: LoggingConfig { level: "info".to_string() },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    history: Option<HistorySection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmSection {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct HistorySection {
    retention_cap: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            config.apply_file(path)?;
        }
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })?;

        if let Some(llm) = file.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(llm_api_key_value.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }
        if let Some(history) = file.history {
            if let Some(retention_cap) = history.retention_cap {
                self.history.retention_cap = retention_cap;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(api_key_value) = env::var("BANNERKIT_GEMINI_API_KEY") {
            if !api_key_value.is_empty() {
                self.llm.api_key = Some(api_key_value.into());
            }
        }
        if let Ok(model) = env::var("BANNERKIT_LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(base_url) = env::var("BANNERKIT_LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = base_url;
            }
        }
        if let Ok(raw) = env::var("BANNERKIT_HISTORY_RETENTION_CAP") {
            self.history.retention_cap = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "BANNERKIT_HISTORY_RETENTION_CAP".to_string(),
                    value: raw.clone(),
                }
            })?;
        }
        if let Ok(level) = env::var("BANNERKIT_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
        }
        if self.history.retention_cap == 0 {
            return Err(ConfigError::Validation(
                "history.retention_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
