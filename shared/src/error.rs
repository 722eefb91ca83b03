//! Error types for the storage codec and load-time validation

use thiserror::Error;

/// Errors raised by writes to the persisted store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Voice note too large ({actual}). Maximum size is {max}. Try recording a shorter note.")]
    VoiceNoteTooLarge { actual: String, max: String },

    #[error("Storage is almost full. Please delete some old roasts to make room.")]
    QuotaExceeded {
        projected_bytes: usize,
        quota_bytes: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Capacity errors are actionable by the user; everything else is internal
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            StorageError::VoiceNoteTooLarge { .. } | StorageError::QuotaExceeded { .. }
        )
    }
}

/// A persisted blob that does not match its schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{key}: malformed JSON: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
