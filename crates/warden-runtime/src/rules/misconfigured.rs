//! Placeholder for records whose configuration could not be parsed

use super::PolicyRule;
use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use warden_core::{PolicyContext, PolicyDecision};

/// Stands in for a rule that failed to build. Evaluating it always errors,
/// so an execution that includes it blocks and names the rule.
#[derive(Debug, Clone)]
pub struct MisconfiguredRule {
    name: String,
    kind: String,
    priority: i32,
    error: RuntimeError,
}

impl MisconfiguredRule {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        priority: i32,
        error: RuntimeError,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            priority,
            error,
        }
    }

    pub fn error(&self) -> &RuntimeError {
        &self.error
    }
}

#[async_trait]
impl PolicyRule for MisconfiguredRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn evaluate(&self, _ctx: &PolicyContext) -> Result<PolicyDecision> {
        Err(self.error.clone())
    }

    fn validate_config(&self) -> Vec<String> {
        vec![self.error.to_string()]
    }
}
