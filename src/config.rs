use crate::prompts::{API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, GREETING, SYSTEM_INSTRUCTION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key. Falls back to `GEMINI_API_KEY` when unset.
    pub api_key: Option<String>,

    /// Model used for every turn
    pub model: String,

    /// Base URL of the Generative Language API
    pub base_url: String,

    /// Timeout applied by the HTTP client, in seconds
    pub request_timeout_secs: u64,

    /// Instruction that scopes the assistant
    pub system_instruction: String,

    /// Assistant turn every conversation starts with
    pub greeting: String,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    /// How many ticks (300ms each) a notification stays on screen
    pub notification_ticks: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            notification_ticks: 17,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            greeting: GREETING.to_string(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Directory holding the config file and the log
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".rigchat"))
    }

    /// Default location of `config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, writing the defaults
    /// there on first run so they can be edited
    pub fn load() -> Result<Self> {
        Self::load_or_init(&Self::default_path()?)
    }

    /// Load configuration from `path`, saving defaults when the file is absent
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }

        let config = Config::default();
        config.save_to(path)?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the file is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get API key from config or environment. Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(present))
    }

    /// Check if API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.greeting, GREETING);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"gemini-2.5-pro\"\n\n[ui]\nshow_timestamps = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.ui.show_timestamps);
        assert_eq!(config.ui.notification_ticks, 17);
    }

    #[test]
    fn save_then_load_preserves_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            api_key: Some("abc123".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("abc123".to_string()));
    }

    #[test]
    fn first_run_writes_editable_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".rigchat").join("config.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.model, DEFAULT_MODEL);

        fs::write(&path, "model = \"gemini-2.5-pro\"\n").unwrap();
        let edited = Config::load_or_init(&path).unwrap();
        assert_eq!(edited.model, "gemini-2.5-pro");
        assert_eq!(edited.greeting, GREETING);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn blank_configured_key_is_not_a_key() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        // GEMINI_API_KEY may be set on the test machine.
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(!config.has_api_key());
        }
    }
}
