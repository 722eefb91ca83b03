//! Common types used across the roast logger

use serde::{Deserialize, Serialize};

/// Unit attached to drum/fan speed readings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SpeedUnit {
    #[serde(rename = "rpm")]
    Rpm,
    #[serde(rename = "%")]
    Percent,
    #[default]
    #[serde(rename = "")]
    Unitless,
}

impl SpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::Rpm => "rpm",
            SpeedUnit::Percent => "%",
            SpeedUnit::Unitless => "",
        }
    }
}

/// Limits applied by the storage codec before every write.
///
/// The quota is an assumption: browsers do not expose the real figure, so
/// usage is estimated as two bytes per stored character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageLimits {
    /// Assumed store capacity in bytes
    pub quota_bytes: usize,
    /// Writes projected at or above this share of the quota are rejected
    pub reject_ratio: f64,
    /// Usage at or above this share of the quota raises the warning banner
    pub warn_ratio: f64,
    /// Maximum length of one encoded voice note, in characters
    pub max_voice_note_chars: usize,
}

impl StorageLimits {
    pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;
    pub const DEFAULT_MAX_VOICE_NOTE_CHARS: usize = 500_000;
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            quota_bytes: Self::DEFAULT_QUOTA_BYTES,
            reject_ratio: 0.95,
            warn_ratio: 0.8,
            max_voice_note_chars: Self::DEFAULT_MAX_VOICE_NOTE_CHARS,
        }
    }
}

/// Approximate store usage, fed to the "storage nearly full" banner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub used: usize,
    pub estimated: usize,
    pub percentage: f64,
    pub is_near_limit: bool,
}

/// Generate a new opaque record id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Format a byte count the way capacity messages show it
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Timer display, zero-padded `MM:SS`
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Timeline cell, `M:SS`
pub fn format_timestamp(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Roast duration, `Xm Ys`; empty when unknown or zero
pub fn format_duration(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) if s > 0 => format!("{}m {}s", s / 60, s % 60),
        _ => String::new(),
    }
}
