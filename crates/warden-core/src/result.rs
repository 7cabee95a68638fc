//! Execution result types

use crate::decision::Decision;
use serde::{Deserialize, Serialize};

/// Delay applied when a DELAY verdict carries no explicit duration (24h)
pub const DEFAULT_DELAY_SECONDS: u64 = 86_400;

/// Warning attached to every result produced under duress mode
pub const DURESS_WARNING: &str = "DURESS_MODE_ACTIVE";

/// Audit entry recorded when duress mode bypasses all rules
pub const DURESS_INTERCEPT: &str = "duress_intercept";

/// Trace of a single rule evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTrace {
    /// Rule name
    pub rule: String,

    /// Rule type key (e.g., "velocity")
    pub rule_type: String,

    /// Configured priority
    pub priority: i32,

    /// The rule's own verdict
    pub decision: Decision,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<u64>,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub reason: String,
}

/// Final output of one executor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Aggregated verdict
    pub decision: Decision,

    /// Rule responsible for the verdict
    pub blocking_rule: Option<String>,

    /// Required wait when the verdict is DELAY
    pub delay_seconds: Option<u64>,

    /// Deduplicated warnings from every evaluated rule
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Deduplicated action tokens from every evaluated rule
    #[serde(default)]
    pub required_actions: Vec<String>,

    /// Rule names in evaluation order
    #[serde(default)]
    pub rules_evaluated: Vec<String>,

    /// Wall-clock duration of the execution
    #[serde(default)]
    pub evaluation_time_ms: f64,

    /// Justification from the deciding rule
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,

    /// Per-rule audit trail
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<RuleTrace>,
}

impl ExecutionResult {
    /// Create a result with the given verdict and nothing else
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            blocking_rule: None,
            delay_seconds: None,
            warnings: Vec::new(),
            required_actions: Vec::new(),
            rules_evaluated: Vec::new(),
            evaluation_time_ms: 0.0,
            reason: None,
            trace: Vec::new(),
        }
        .normalized()
    }

    /// Result returned when duress mode short-circuits evaluation
    pub fn duress_intercept() -> Self {
        let mut result = Self::new(Decision::Allow);
        result.warnings.push(DURESS_WARNING.to_string());
        result.rules_evaluated.push(DURESS_INTERCEPT.to_string());
        result
    }

    /// Fail-closed result for a rule whose evaluation failed
    pub fn evaluation_error(rule: &str, rules_evaluated: Vec<String>, error: String) -> Self {
        let mut result = Self::new(Decision::Block);
        result.blocking_rule = Some(format!("{} (evaluation error)", rule));
        result.rules_evaluated = rules_evaluated;
        result.reason = Some(error);
        result
    }

    /// Enforce the DELAY invariant: a delayed result always carries a duration
    pub fn normalized(mut self) -> Self {
        if self.decision == Decision::Delay && self.delay_seconds.map_or(true, |s| s == 0) {
            self.delay_seconds = Some(DEFAULT_DELAY_SECONDS);
        }
        self
    }

    /// The transaction is blocked outright
    pub fn is_blocked(&self) -> bool {
        self.decision == Decision::Block
    }

    /// The transaction may proceed, possibly after a delay or verification
    pub fn is_allowed(&self) -> bool {
        self.decision.permits()
    }
}
