//! Runtime error types

use thiserror::Error;

/// Runtime error
///
/// Any of these raised while evaluating a rule makes the executor fail
/// closed for the whole execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Rule configuration could not be parsed
    #[error("Invalid configuration for rule '{rule}': {message}")]
    InvalidConfig { rule: String, message: String },

    /// Rule failed while evaluating
    #[error("Rule '{rule}' failed: {message}")]
    Evaluation { rule: String, message: String },

    /// Rule exceeded the executor's per-rule timeout
    #[error("Rule '{rule}' timed out after {timeout_ms}ms")]
    Timeout { rule: String, timeout_ms: u64 },

    /// Rule panicked while evaluating
    #[error("Rule '{rule}' panicked during evaluation")]
    Panicked { rule: String },
}

impl RuntimeError {
    pub fn invalid_config(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::InvalidConfig {
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn evaluation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Evaluation {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RuntimeError::invalid_config("Daily Limit", "max_daily_usd: invalid type");
        assert!(err.to_string().contains("Daily Limit"));
        assert!(err.to_string().contains("max_daily_usd"));

        let err = RuntimeError::Timeout {
            rule: "Reputation".to_string(),
            timeout_ms: 250,
        };
        assert!(err.to_string().contains("250ms"));

        let err = RuntimeError::Panicked {
            rule: "Broken".to_string(),
        };
        assert_eq!(err.to_string(), "Rule 'Broken' panicked during evaluation");
    }
}
