//! Error handling for the Coffee Roast Logger
//!
//! Expected conditions (missing ids, empty collections, invalid blobs) never
//! reach this type. What does reach it is either actionable by the user
//! (capacity, device) or internal.

use serde::Serialize;
use shared::StorageError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Capacity errors
    #[error("{0}")]
    Capacity(StorageError),

    // Device errors
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Recording device error: {0}")]
    Device(String),

    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("No roast session is active")]
    NoActiveSession,

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(msg) => AppError::Validation(msg),
            err if err.is_capacity() => AppError::Capacity(err),
            err => AppError::Storage(err),
        }
    }
}

/// Error payload for the UI layer
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub user_facing: bool,
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Capacity(_) => "CAPACITY_EXCEEDED",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::Device(_) => "DEVICE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NoActiveSession => "NO_ACTIVE_SESSION",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors the user can act on, shown as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Capacity(_)
                | AppError::PermissionDenied
                | AppError::Device(_)
                | AppError::Validation(_)
                | AppError::NotFound(_)
        )
    }

    /// Message suitable for a toast or banner
    pub fn user_message(&self) -> String {
        match self {
            AppError::Capacity(err) => err.to_string(),
            AppError::PermissionDenied => {
                "Microphone access was denied. Allow microphone access to record voice notes."
                    .to_string()
            }
            AppError::Device(msg) => format!("Recording failed: {}", msg),
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Log the error and turn it into a UI payload
    pub fn report(&self) -> ErrorDetail {
        if self.is_user_facing() {
            tracing::warn!("{}: {}", self.code(), self);
        } else {
            tracing::error!("Error: {:?}", self);
        }

        ErrorDetail {
            code: self.code().to_string(),
            message: self.user_message(),
            user_facing: self.is_user_facing(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
