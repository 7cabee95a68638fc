//! Error types for Warden Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown membership tier: {0}")]
    UnknownTier(String),

    #[error("Unknown decision: {0}")]
    UnknownDecision(String),

    #[error("Unknown rule type: {0}")]
    UnknownRuleType(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
