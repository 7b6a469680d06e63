// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for NewsClassify

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language::LanguageCode;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Default output language for summaries
    #[serde(default)]
    pub language: LanguageCode,

    /// Feedback prompt timing
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Where the session context (credential, flags) is kept
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout; classification of long videos is slow
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay between the results appearing and the prompt opening
    #[serde(default = "default_open_delay")]
    pub open_delay_ms: u64,
    /// How long the thank-you state stays up
    #[serde(default = "default_success_display")]
    pub success_display_ms: u64,
    /// How long a submission error stays up before the form comes back
    #[serde(default = "default_error_display")]
    pub error_display_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_context_path")]
    pub path: String,
}

// Default value functions
fn default_base_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_timeout() -> u64 { 300 }
fn default_true() -> bool { true }
fn default_open_delay() -> u64 { 1500 }
fn default_success_display() -> u64 { 2000 }
fn default_error_display() -> u64 { 3000 }
fn default_context_path() -> String { "newsclassify_session.json".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            language: LanguageCode::default(),
            feedback: FeedbackConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_delay_ms: default_open_delay(),
            success_display_ms: default_success_display(),
            error_display_ms: default_error_display(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            path: default_context_path(),
        }
    }
}

impl FeedbackConfig {
    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::NewsClassifyError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn context_path(&self) -> PathBuf {
        PathBuf::from(&self.context.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.language, LanguageCode::En);
        assert_eq!(config.feedback.open_delay(), Duration::from_millis(1500));
        assert_eq!(config.feedback.success_display(), Duration::from_secs(2));
        assert_eq!(config.feedback.error_display(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "language": "PT", "api": { "base_url": "http://news:8000" } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.language, LanguageCode::Pt);
        assert_eq!(config.api.base_url, "http://news:8000");
        assert_eq!(config.api.timeout_secs, 300);
        assert!(config.feedback.enabled);
    }

    #[test]
    fn test_bad_language_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "language": "xx" }"#).unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, crate::NewsClassifyError::Config(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.feedback.enabled = false;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert!(!loaded.feedback.enabled);
    }
}
