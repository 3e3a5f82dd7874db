use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Configuration for the coaching engine
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub llm:     LlmConfig,
    pub retry:   RetryConfig
}

impl Default for Config {
    fn default() -> Self {
        Self { storage: StorageConfig::default(), llm: LlmConfig::default(), retry: RetryConfig::default() }
    }
}

/// Storage backend configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory; defaults to the platform data dir when unset
    pub data_dir: Option<PathBuf>
}

/// What `send_message` does when the invoker fails or times out
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferencePolicy {
    /// Answer with a canned assistant message instead of failing the call
    Fallback,
    /// Fail the call; nothing is appended or persisted
    Propagate
}

/// Generation parameters and failure policy for the LLM invoker
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint; the canned offline invoker is used when unset
    pub base_url:     Option<String>,
    pub api_key:      Option<String>,
    pub model:        String,
    pub max_tokens:   u32,
    pub temperature:  f32,
    /// Bound on a single invoker call, in seconds
    pub timeout_secs: u64,
    pub on_failure:   InferencePolicy
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url:     None,
            api_key:      None,
            model:        "gpt-4o-mini".to_string(),
            max_tokens:   512,
            temperature:  0.7,
            timeout_secs: 30,
            on_failure:   InferencePolicy::Fallback
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policy for transient workflow step failures
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempt bound per step, including the first try
    pub max_attempts:  u32,
    /// Backoff doubles from this base between attempts
    pub base_delay_ms: u64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 500 }
    }
}

/// Get the project directories for cross-platform path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "fincoach").context("Failed to determine project directories")
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Get the default database directory path
pub fn get_data_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.data_dir().join("db"))
}

/// Get the config file path
pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

/// Load configuration from file or create default if it doesn't exist
pub fn load_config() -> Result<Config> {
    let config_path = get_config_file_path()?;

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")
    } else {
        let config = Config::default();
        save_config(&config)?;
        Ok(config)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config) -> Result<()> {
    let config_path = get_config_file_path()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(config).context("Failed to serialize config")?;

    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.on_failure, InferencePolicy::Fallback);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str("llm:\n  model: local-7b\n  on_failure: propagate\n").unwrap();
        assert_eq!(config.llm.model, "local-7b");
        assert_eq!(config.llm.on_failure, InferencePolicy::Propagate);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.retry.base_delay_ms, 500);
    }
}
