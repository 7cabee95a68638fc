//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use rust_decimal::Decimal;
use warden_sdk::{
    Decision, EvaluationRequest, ExecutionResult, PolicyEvaluator, PolicyRecord, PolicySet,
};

pub const DESTINATION: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fE89";

/// Test helper that evaluates requests against policies given as YAML
pub struct TestEvaluator {
    evaluator: PolicyEvaluator,
    policies: Vec<PolicyRecord>,
}

impl TestEvaluator {
    pub fn new() -> Self {
        Self {
            evaluator: PolicyEvaluator::new(),
            policies: Vec::new(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: PolicyEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Add the policies of a YAML policy set
    pub fn with_policies_yaml(mut self, yaml: &str) -> Self {
        let set = PolicySet::from_yaml_str(yaml.trim()).expect("Failed to parse policy set");
        self.policies.extend(set.policies);
        self
    }

    pub fn with_policy(mut self, record: PolicyRecord) -> Self {
        self.policies.push(record);
        self
    }

    pub fn policies(&self) -> &[PolicyRecord] {
        &self.policies
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Evaluate a request, attaching this helper's policies
    pub async fn evaluate(&self, request: EvaluationRequest) -> ExecutionResult {
        self.evaluator
            .evaluate_transaction(request.with_policies(self.policies.clone()))
            .await
            .expect("Evaluation failed")
    }
}

/// A humpback user's transfer of `value_usd` to a new address
pub fn request(value_usd: Decimal) -> EvaluationRequest {
    EvaluationRequest::new("user123", "ethereum", DESTINATION, value_usd).with_tier("humpback")
}

/// Assertion helpers for ExecutionResult
pub trait ResultAssertions {
    fn assert_decision(&self, expected: Decision);
    fn assert_blocked_by(&self, rule: &str);
    fn assert_delay(&self, seconds: u64);
    fn assert_reason_contains(&self, text: &str);
    fn assert_warning_contains(&self, text: &str);
    fn assert_rules_evaluated(&self, expected: &[&str]);
}

impl ResultAssertions for ExecutionResult {
    fn assert_decision(&self, expected: Decision) {
        assert_eq!(
            self.decision, expected,
            "Expected decision {}, got {} (reason: {:?})",
            expected, self.decision, self.reason
        );
    }

    fn assert_blocked_by(&self, rule: &str) {
        assert_eq!(self.blocking_rule.as_deref(), Some(rule));
    }

    fn assert_delay(&self, seconds: u64) {
        self.assert_decision(Decision::Delay);
        assert_eq!(self.delay_seconds, Some(seconds));
    }

    fn assert_reason_contains(&self, text: &str) {
        let reason = self.reason.as_deref().unwrap_or("");
        assert!(
            reason.contains(text),
            "Expected reason containing '{}', got '{}'",
            text,
            reason
        );
    }

    fn assert_warning_contains(&self, text: &str) {
        assert!(
            self.warnings.iter().any(|w| w.contains(text)),
            "Expected a warning containing '{}', got {:?}",
            text,
            self.warnings
        );
    }

    fn assert_rules_evaluated(&self, expected: &[&str]) {
        let actual: Vec<&str> = self.rules_evaluated.iter().map(String::as_str).collect();
        assert_eq!(actual, expected);
    }
}
