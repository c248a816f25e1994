//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::chat::HistoryLimit;
use crate::Result;
use crate::error::Error;

/// Default Gemini REST base URL (the model and method are appended).
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the models collection
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Ask for typed, line-oriented JSON output instead of prose
    #[serde(default)]
    pub structured: bool,

    /// Prefix the resent transcript with an explanatory header
    #[serde(default = "default_true")]
    pub history_header: bool,

    /// Bound on how much of the transcript is resent every turn
    #[serde(default)]
    pub history: HistoryLimit,

    /// Typewriter effect for responses
    #[serde(default)]
    pub typewriter: TypewriterConfig,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Exact input that ends the session
    #[serde(default = "default_stop_token")]
    pub stop_token: String,
}

/// Pacing of the typewriter effect.
///
/// After every `chunk_chars` characters output pauses for `pause_ms`;
/// positions that are a multiple of `long_chunk_chars` instead pause for
/// `long_pause_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypewriterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,

    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    #[serde(default = "default_long_chunk_chars")]
    pub long_chunk_chars: usize,

    #[serde(default = "default_long_pause_ms")]
    pub long_pause_ms: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_endpoint() -> String {
    GEMINI_API_URL.to_string()
}

fn default_stop_token() -> String {
    "stop".to_string()
}

fn default_true() -> bool {
    true
}

fn default_chunk_chars() -> usize {
    100
}

fn default_pause_ms() -> u64 {
    50
}

fn default_long_chunk_chars() -> usize {
    501
}

fn default_long_pause_ms() -> u64 {
    150
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_chars: default_chunk_chars(),
            pause_ms: default_pause_ms(),
            long_chunk_chars: default_long_chunk_chars(),
            long_pause_ms: default_long_pause_ms(),
        }
    }
}

impl TypewriterConfig {
    /// Typewriter that prints immediately.
    pub fn instant() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            structured: false,
            history_header: true,
            history: HistoryLimit::default(),
            typewriter: TypewriterConfig::default(),
            request_timeout_secs: None,
            stop_token: default_stop_token(),
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".askai-cli")
}

/// Get the API key file path
pub fn key_path() -> PathBuf {
    config_dir().join("config")
}

/// Get the optional settings file path
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load settings from the default location, falling back to defaults when
/// the file does not exist.
pub fn load() -> Result<Config> {
    load_from(&settings_path())
}

/// Load settings from `path`
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid settings file {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash-lite");
        assert_eq!(config.stop_token, "stop");
        assert_eq!(config.history.max_turns, Some(40));
        assert!(config.history_header);
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "gemini-2.0-flash", "structured": true}"#).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.structured);
        assert_eq!(config.endpoint, GEMINI_API_URL);
        assert!(config.typewriter.enabled);
        assert_eq!(config.typewriter.chunk_chars, 100);
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(config.model, default_model());
    }

    #[test]
    fn test_invalid_settings_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_key_path_layout() {
        let path = key_path();
        assert!(path.ends_with(".askai-cli/config"));
    }
}
