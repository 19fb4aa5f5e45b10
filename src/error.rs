//! Error types for signsync.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignSyncError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("No action configured for class {index}")]
    UnmappedClass { index: usize },

    // Landmark input errors
    #[error("Landmark source error: {message}")]
    LandmarkSource { message: String },

    // Classifier errors
    #[error("Classifier model not found at {path}")]
    ClassifierModelNotFound { path: String },

    #[error("Failed to load classifier from {path}: {message}")]
    ClassifierLoad { path: String, message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    // Output errors
    #[error("Output command not found: {command}")]
    OutputCommandNotFound { command: String },

    #[error("Sentence delivery failed: {message}")]
    DeliveryFailed { message: String },

    #[error("Pipeline station '{station}' stopped: {message}")]
    PipelineFailed { station: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SignSyncError {
    /// True for errors that must abort startup rather than degrade a tick.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignSyncError::ConfigFileNotFound { .. }
                | SignSyncError::ConfigParse { .. }
                | SignSyncError::ConfigInvalidValue { .. }
                | SignSyncError::Config(_)
                | SignSyncError::ShapeMismatch { .. }
                | SignSyncError::UnmappedClass { .. }
        )
    }

    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        SignSyncError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignSyncError>;
