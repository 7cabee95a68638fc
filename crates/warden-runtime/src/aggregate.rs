//! Decision aggregation
//!
//! Folds the per-rule decisions of one execution into a single
//! [`ExecutionResult`]. The most restrictive verdict wins:
//! BLOCK > DELAY > REQUIRE_2FA > WARN > ALLOW.

use warden_core::{Decision, ExecutionResult, PolicyDecision, RuleTrace, TWO_FACTOR_ACTION};

/// A rule's decision, tagged with the rule that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: String,
    pub rule_type: String,
    pub priority: i32,
    pub decision: PolicyDecision,
}

impl RuleOutcome {
    fn trace(&self) -> RuleTrace {
        RuleTrace {
            rule: self.rule.clone(),
            rule_type: self.rule_type.clone(),
            priority: self.priority,
            decision: self.decision.verdict(),
            delay_seconds: self.decision.effective_delay(),
            reason: self.decision.reason.clone(),
        }
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

fn non_empty(reason: &str) -> Option<String> {
    (!reason.is_empty()).then(|| reason.to_string())
}

/// Combine outcomes, given in evaluation order, into the final result
pub fn aggregate_decisions(outcomes: &[RuleOutcome]) -> ExecutionResult {
    let mut warnings = Vec::new();
    let mut required_actions = Vec::new();
    for outcome in outcomes {
        push_unique(&mut warnings, &outcome.decision.warnings);
        push_unique(&mut required_actions, &outcome.decision.required_actions);
    }

    let first_block = outcomes.iter().find(|o| !o.decision.allowed);

    // First rule wins ties on the longest delay
    let longest_delay = outcomes
        .iter()
        .filter_map(|o| o.decision.effective_delay().map(|s| (o, s)))
        .fold(None, |best: Option<(&RuleOutcome, u64)>, (o, s)| match best {
            Some((_, max)) if s <= max => best,
            _ => Some((o, s)),
        });

    let first_2fa = outcomes.iter().find(|o| o.decision.require_2fa);

    let mut result = if let Some(blocker) = first_block {
        let mut result = ExecutionResult::new(Decision::Block);
        result.blocking_rule = Some(blocker.rule.clone());
        result.reason = non_empty(&blocker.decision.reason);
        result
    } else if let Some((delayer, seconds)) = longest_delay {
        let mut result = ExecutionResult::new(Decision::Delay);
        result.blocking_rule = Some(delayer.rule.clone());
        result.delay_seconds = Some(seconds);
        result.reason = non_empty(&delayer.decision.reason);
        result
    } else if let Some(verifier) = first_2fa {
        push_unique(&mut required_actions, &[TWO_FACTOR_ACTION.to_string()]);
        let mut result = ExecutionResult::new(Decision::Require2fa);
        result.reason = non_empty(&verifier.decision.reason);
        result
    } else if !warnings.is_empty() {
        ExecutionResult::new(Decision::Warn)
    } else {
        ExecutionResult::new(Decision::Allow)
    };

    result.warnings = warnings;
    result.required_actions = required_actions;
    result.rules_evaluated = outcomes.iter().map(|o| o.rule.clone()).collect();
    result.trace = outcomes.iter().map(RuleOutcome::trace).collect();
    result.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(rule: &str, decision: PolicyDecision) -> RuleOutcome {
        RuleOutcome {
            rule: rule.to_string(),
            rule_type: "test".to_string(),
            priority: 0,
            decision,
        }
    }

    #[test]
    fn test_empty_is_allow() {
        let result = aggregate_decisions(&[]);
        assert_eq!(result.decision, Decision::Allow);
        assert!(result.rules_evaluated.is_empty());
        assert!(result.blocking_rule.is_none());
    }

    #[test]
    fn test_first_block_wins() {
        let result = aggregate_decisions(&[
            outcome("a", PolicyDecision::delay(600, "wait")),
            outcome("b", PolicyDecision::block("no")),
            outcome("c", PolicyDecision::block("also no")),
        ]);

        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.blocking_rule.as_deref(), Some("b"));
        assert_eq!(result.reason.as_deref(), Some("no"));
        assert_eq!(result.delay_seconds, None);
        assert_eq!(result.rules_evaluated, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_longest_delay_wins() {
        let result = aggregate_decisions(&[
            outcome("short", PolicyDecision::delay(3_600, "1h")),
            outcome("long", PolicyDecision::delay(86_400, "24h")),
            outcome("tied", PolicyDecision::delay(86_400, "also 24h")),
            outcome("2fa", PolicyDecision::require_verification(TWO_FACTOR_ACTION)),
        ]);

        assert_eq!(result.decision, Decision::Delay);
        assert_eq!(result.delay_seconds, Some(86_400));
        assert_eq!(result.blocking_rule.as_deref(), Some("long"));
        assert_eq!(result.required_actions, vec![TWO_FACTOR_ACTION.to_string()]);
    }

    #[test]
    fn test_zero_delay_is_not_a_delay() {
        let result = aggregate_decisions(&[outcome("zero", PolicyDecision::delay(0, ""))]);
        assert_eq!(result.decision, Decision::Allow);
        assert_eq!(result.delay_seconds, None);
    }

    #[test]
    fn test_require_2fa_has_no_blocking_rule() {
        let result = aggregate_decisions(&[
            outcome("warn", PolicyDecision::allow(vec!["careful".to_string()])),
            outcome(
                "2fa",
                PolicyDecision::require_verification(TWO_FACTOR_ACTION).with_reason("big"),
            ),
        ]);

        assert_eq!(result.decision, Decision::Require2fa);
        assert!(result.blocking_rule.is_none());
        assert_eq!(result.reason.as_deref(), Some("big"));
        assert_eq!(result.required_actions, vec![TWO_FACTOR_ACTION.to_string()]);
        assert_eq!(result.warnings, vec!["careful".to_string()]);
    }

    #[test]
    fn test_warnings_deduplicated_in_order() {
        let result = aggregate_decisions(&[
            outcome("a", PolicyDecision::allow(vec!["x".to_string(), "y".to_string()])),
            outcome("b", PolicyDecision::allow(vec!["y".to_string(), "z".to_string()])),
        ]);

        assert_eq!(result.decision, Decision::Warn);
        assert_eq!(result.warnings, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_trace_records_each_verdict() {
        let result = aggregate_decisions(&[
            outcome("a", PolicyDecision::allow(Vec::new())),
            outcome("b", PolicyDecision::delay(60, "wait a minute")),
        ]);

        assert_eq!(result.trace.len(), 2);
        assert_eq!(result.trace[0].decision, Decision::Allow);
        assert_eq!(result.trace[1].decision, Decision::Delay);
        assert_eq!(result.trace[1].delay_seconds, Some(60));
    }

    #[test]
    fn test_order_independent_verdict() {
        let decisions = vec![
            outcome("a", PolicyDecision::require_verification(TWO_FACTOR_ACTION)),
            outcome("b", PolicyDecision::delay(120, "")),
            outcome("c", PolicyDecision::allow(vec!["w".to_string()])),
        ];
        let mut reversed = decisions.clone();
        reversed.reverse();

        let forward = aggregate_decisions(&decisions);
        let backward = aggregate_decisions(&reversed);
        assert_eq!(forward.decision, backward.decision);
        assert_eq!(forward.delay_seconds, backward.delay_seconds);
    }
}
