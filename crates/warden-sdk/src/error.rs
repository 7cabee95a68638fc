//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Core type error (e.g., negative amounts)
    #[error("Invalid input: {0}")]
    CoreError(#[from] warden_core::CoreError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] warden_runtime::RuntimeError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Evaluation request is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
