//! Configuration management for the Coffee Roast Logger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with ROASTLOG_ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::StorageLimits;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Local store configuration
    pub storage: StorageConfig,

    /// Roast timer configuration
    pub timer: TimerConfig,

    /// Voice note recording configuration
    pub recording: RecordingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// JSON file holding every persisted collection
    pub path: PathBuf,

    /// Assumed store capacity in bytes
    pub quota_bytes: usize,

    /// Share of the quota at which writes are rejected
    pub reject_ratio: f64,

    /// Share of the quota at which the "nearly full" warning shows
    pub warn_ratio: f64,

    /// Maximum encoded voice note length in characters
    pub max_voice_note_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimerConfig {
    /// How often the elapsed display is recomputed
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecordingConfig {
    /// Directory for natively captured voice notes
    pub directory: PathBuf,

    /// MIME type used for encoded voice notes
    pub mime_type: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ROASTLOG_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let defaults = StorageLimits::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("storage.path", "data/roastlog.json")?
            .set_default("storage.quota_bytes", defaults.quota_bytes as u64)?
            .set_default("storage.reject_ratio", defaults.reject_ratio)?
            .set_default("storage.warn_ratio", defaults.warn_ratio)?
            .set_default(
                "storage.max_voice_note_chars",
                defaults.max_voice_note_chars as u64,
            )?
            .set_default("timer.poll_interval_ms", 100)?
            .set_default("recording.directory", "data/voice")?
            .set_default("recording.mime_type", "audio/webm")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ROASTLOG_ prefix)
            .add_source(
                Environment::with_prefix("ROASTLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl StorageConfig {
    pub fn limits(&self) -> StorageLimits {
        StorageLimits {
            quota_bytes: self.quota_bytes,
            reject_ratio: self.reject_ratio,
            warn_ratio: self.warn_ratio,
            max_voice_note_chars: self.max_voice_note_chars,
        }
    }
}

impl TimerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let config = Config::load().unwrap();
        assert_eq!(config.timer.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.storage.limits(), StorageLimits::default());
        assert_eq!(config.recording.mime_type, "audio/webm");
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let timer = TimerConfig { poll_interval_ms: 0 };
        assert_eq!(timer.poll_interval(), Duration::from_millis(1));
    }
}
