//! Policy executor
//!
//! Loads, orders and runs rules for one user's policy set, then aggregates
//! their decisions. Execution never returns an error: a rule that errors,
//! panics or times out blocks the transaction.

use crate::aggregate::{aggregate_decisions, RuleOutcome};
use crate::error::{Result, RuntimeError};
use crate::registry::RuleRegistry;
use crate::rules::PolicyRule;
use futures::FutureExt;
use std::cmp::Reverse;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use warden_core::{
    short_address, ExecutionResult, PolicyContext, PolicyDecision, PolicyRecord, TransactionContext,
};

/// Executor tuning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Upper bound on a single rule evaluation; None disables the bound
    ///
    /// The timer needs a Tokio runtime. Executed outside one, every rule
    /// fails and the transaction is blocked.
    pub rule_timeout: Option<Duration>,
}

/// Runs an ordered set of rules against transactions
#[derive(Debug, Clone)]
pub struct PolicyExecutor {
    /// Active rules, highest priority first
    rules: Vec<Arc<dyn PolicyRule>>,
    registry: Arc<RuleRegistry>,
    options: ExecutorOptions,
}

impl Default for PolicyExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyExecutor {
    /// Create an executor with the built-in rule types and no rules
    pub fn new() -> Self {
        Self::with_registry(Arc::new(RuleRegistry::with_builtin_rules()))
    }

    /// Create an executor backed by a shared registry
    pub fn with_registry(registry: Arc<RuleRegistry>) -> Self {
        Self {
            rules: Vec::new(),
            registry,
            options: ExecutorOptions::default(),
        }
    }

    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Replace the rule list with the given rules, ordered by priority
    pub fn with_rules(mut self, rules: Vec<Arc<dyn PolicyRule>>) -> Self {
        self.rules = rules;
        sort_by_priority(&mut self.rules);
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[Arc<dyn PolicyRule>] {
        &self.rules
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Add a single rule, keeping the priority order
    pub fn add_rule(&mut self, rule: Arc<dyn PolicyRule>) {
        self.rules.push(rule);
        sort_by_priority(&mut self.rules);
    }

    /// Replace the rule list with rules instantiated from policy records
    ///
    /// Inactive records and records of unregistered types are skipped.
    /// Returns the number of rules loaded.
    pub fn load_rules_from_config(&mut self, policies: &[PolicyRecord]) -> usize {
        let mut rules = Vec::with_capacity(policies.len());

        for record in policies {
            if !record.is_active {
                tracing::debug!(rule = record.effective_name(), "Skipping inactive policy");
                continue;
            }
            match self.registry.instantiate(record) {
                Some(rule) => rules.push(rule),
                None => {
                    tracing::warn!(
                        rule = record.effective_name(),
                        rule_type = %record.rule_type,
                        "Unknown rule type"
                    );
                }
            }
        }

        sort_by_priority(&mut rules);
        self.rules = rules;

        tracing::info!(count = self.rules.len(), "Loaded policy rules");
        self.rules.len()
    }

    /// Evaluate a transaction against all rules
    pub async fn execute(&self, tx: &TransactionContext) -> ExecutionResult {
        self.execute_in_context(&PolicyContext::from_transaction(tx.clone()))
            .await
    }

    /// Evaluate with a prepared context (e.g., one carrying recent history)
    pub async fn execute_in_context(&self, ctx: &PolicyContext) -> ExecutionResult {
        let start = Instant::now();
        let tx = &ctx.transaction;

        tracing::info!(
            user_id = %tx.user_id,
            chain = %tx.chain,
            to_address = %short_address(&tx.to_address),
            value_usd = %tx.value_usd,
            rules_count = self.rules.len(),
            "Executing policy evaluation"
        );

        if tx.duress_mode_active {
            tracing::warn!(user_id = %tx.user_id, "Duress mode active - bypassing policy rules");
            let mut result = ExecutionResult::duress_intercept();
            result.evaluation_time_ms = elapsed_ms(start);
            return result;
        }

        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            match self.evaluate_rule(rule.as_ref(), ctx).await {
                Ok(decision) => {
                    tracing::debug!(
                        rule = rule.name(),
                        allowed = decision.allowed,
                        require_2fa = decision.require_2fa,
                        delay_seconds = ?decision.delay_seconds,
                        "Rule evaluated"
                    );
                    outcomes.push(RuleOutcome {
                        rule: rule.name().to_string(),
                        rule_type: rule.kind().to_string(),
                        priority: rule.priority(),
                        decision,
                    });
                }
                Err(e) => {
                    tracing::error!(rule = rule.name(), error = %e, "Rule evaluation failed");
                    let mut evaluated: Vec<String> = outcomes.into_iter().map(|o| o.rule).collect();
                    evaluated.push(rule.name().to_string());
                    let mut result =
                        ExecutionResult::evaluation_error(rule.name(), evaluated, e.to_string());
                    result.evaluation_time_ms = elapsed_ms(start);
                    return result;
                }
            }
        }

        let mut result = aggregate_decisions(&outcomes);
        result.evaluation_time_ms = elapsed_ms(start);

        tracing::info!(
            decision = %result.decision,
            blocking_rule = ?result.blocking_rule,
            eval_time_ms = result.evaluation_time_ms,
            "Policy evaluation complete"
        );

        result
    }

    async fn evaluate_rule(&self, rule: &dyn PolicyRule, ctx: &PolicyContext) -> Result<PolicyDecision> {
        let rule_timeout = self.options.rule_timeout;

        // The timer is created inside the guard, so a missing runtime is caught too
        let guarded = AssertUnwindSafe(async move {
            match rule_timeout {
                Some(limit) => tokio::time::timeout(limit, rule.evaluate(ctx))
                    .await
                    .unwrap_or_else(|_| {
                        Err(RuntimeError::Timeout {
                            rule: rule.name().to_string(),
                            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        })
                    }),
                None => rule.evaluate(ctx).await,
            }
        })
        .catch_unwind();

        guarded.await.unwrap_or_else(|_| {
            Err(RuntimeError::Panicked {
                rule: rule.name().to_string(),
            })
        })
    }
}

/// Stable sort, highest priority first
fn sort_by_priority(rules: &mut [Arc<dyn PolicyRule>]) {
    rules.sort_by_key(|r| Reverse(r.priority()));
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Builder for [`PolicyExecutor`]
#[derive(Debug, Default)]
pub struct ExecutorBuilder {
    registry: Option<Arc<RuleRegistry>>,
    options: ExecutorOptions,
    rules: Vec<Arc<dyn PolicyRule>>,
    policies: Vec<PolicyRecord>,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a shared registry instead of the built-in one
    pub fn with_registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Bound each rule evaluation
    pub fn with_rule_timeout(mut self, timeout: Duration) -> Self {
        self.options.rule_timeout = Some(timeout);
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a pre-built rule
    pub fn add_rule(mut self, rule: Arc<dyn PolicyRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add policy records to instantiate through the registry
    pub fn add_policies(mut self, policies: impl IntoIterator<Item = PolicyRecord>) -> Self {
        self.policies.extend(policies);
        self
    }

    pub fn build(self) -> PolicyExecutor {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(RuleRegistry::with_builtin_rules()));
        let mut executor = PolicyExecutor::with_registry(registry).with_options(self.options);

        if !self.policies.is_empty() {
            executor.load_rules_from_config(&self.policies);
        }
        for rule in self.rules {
            executor.add_rule(rule);
        }
        executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{VelocityConfig, VelocityRule, WhitelistConfig, WhitelistRule};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use warden_core::{Decision, DURESS_INTERCEPT, DURESS_WARNING, TWO_FACTOR_ACTION};

    #[derive(Debug)]
    enum Behavior {
        Allow,
        Block,
        Fail,
        Panic,
        Hang,
    }

    #[derive(Debug)]
    struct ScriptedRule {
        name: String,
        priority: i32,
        behavior: Behavior,
    }

    fn scripted(name: &str, priority: i32, behavior: Behavior) -> Arc<dyn PolicyRule> {
        Arc::new(ScriptedRule {
            name: name.to_string(),
            priority,
            behavior,
        })
    }

    #[async_trait]
    impl PolicyRule for ScriptedRule {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> &str {
            "scripted"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn evaluate(&self, _ctx: &PolicyContext) -> Result<PolicyDecision> {
            match self.behavior {
                Behavior::Allow => Ok(PolicyDecision::allow(Vec::new())),
                Behavior::Block => Ok(PolicyDecision::block("scripted block")),
                Behavior::Fail => Err(RuntimeError::evaluation(&self.name, "backend unavailable")),
                Behavior::Panic => panic!("scripted panic"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(PolicyDecision::allow(Vec::new()))
                }
            }
        }
    }

    fn transaction(value_usd: rust_decimal::Decimal) -> TransactionContext {
        TransactionContext::new("ethereum", "0x742d35Cc6634C0532925a3b844Bc9e7595f8fE89", value_usd)
            .with_user("user123", "humpback")
    }

    #[tokio::test]
    async fn test_empty_executor_allows() {
        let result = PolicyExecutor::new().execute(&transaction(dec!(100))).await;

        assert_eq!(result.decision, Decision::Allow);
        assert!(result.rules_evaluated.is_empty());
        assert!(result.evaluation_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_duress_bypasses_every_rule() {
        let executor = PolicyExecutor::new().with_rules(vec![
            scripted("Block All", 100, Behavior::Block),
            scripted("Broken", 50, Behavior::Fail),
        ]);
        let result = executor.execute(&transaction(dec!(1000000)).with_duress(true)).await;

        assert_eq!(result.decision, Decision::Allow);
        assert_eq!(result.warnings, vec![DURESS_WARNING.to_string()]);
        assert_eq!(result.rules_evaluated, vec![DURESS_INTERCEPT.to_string()]);
        assert!(result.blocking_rule.is_none());
    }

    #[tokio::test]
    async fn test_priority_order_is_stable() {
        let executor = PolicyExecutor::new().with_rules(vec![
            scripted("low", 1, Behavior::Allow),
            scripted("tie-a", 5, Behavior::Allow),
            scripted("high", 10, Behavior::Allow),
            scripted("tie-b", 5, Behavior::Allow),
        ]);
        let result = executor.execute(&transaction(dec!(1))).await;

        assert_eq!(result.rules_evaluated, vec!["high", "tie-a", "tie-b", "low"]);
    }

    #[tokio::test]
    async fn test_first_blocking_rule_is_reported() {
        let executor = PolicyExecutor::new().with_rules(vec![
            scripted("second", 5, Behavior::Block),
            scripted("first", 10, Behavior::Block),
        ]);
        let result = executor.execute(&transaction(dec!(1))).await;

        assert!(result.is_blocked());
        assert_eq!(result.blocking_rule.as_deref(), Some("first"));
        assert_eq!(result.rules_evaluated.len(), 2);
    }

    #[tokio::test]
    async fn test_rule_error_fails_closed() {
        let executor = PolicyExecutor::new().with_rules(vec![
            scripted("ok", 10, Behavior::Allow),
            scripted("broken", 5, Behavior::Fail),
            scripted("never", 1, Behavior::Allow),
        ]);
        let result = executor.execute(&transaction(dec!(1))).await;

        assert_eq!(result.decision, Decision::Block);
        assert_eq!(result.blocking_rule.as_deref(), Some("broken (evaluation error)"));
        assert_eq!(result.rules_evaluated, vec!["ok", "broken"]);
        assert!(result.reason.unwrap().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_panicking_rule_fails_closed() {
        let executor = PolicyExecutor::new().with_rules(vec![scripted("explodes", 1, Behavior::Panic)]);
        let result = executor.execute(&transaction(dec!(1))).await;

        assert!(result.is_blocked());
        assert_eq!(result.blocking_rule.as_deref(), Some("explodes (evaluation error)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_rule_times_out() {
        let executor = PolicyExecutor::builder()
            .with_rule_timeout(Duration::from_millis(250))
            .add_rule(scripted("slow", 1, Behavior::Hang))
            .build();
        let result = executor.execute(&transaction(dec!(1))).await;

        assert!(result.is_blocked());
        assert_eq!(result.blocking_rule.as_deref(), Some("slow (evaluation error)"));
        assert!(result.reason.unwrap().contains("250ms"));
    }

    #[test]
    fn test_timeout_outside_tokio_fails_closed() {
        let rules = vec![scripted("ok", 1, Behavior::Allow)];

        let untimed = PolicyExecutor::new().with_rules(rules.clone());
        let result = futures::executor::block_on(untimed.execute(&transaction(dec!(1))));
        assert_eq!(result.decision, Decision::Allow);

        let timed = PolicyExecutor::builder()
            .with_rule_timeout(Duration::from_millis(250))
            .build()
            .with_rules(rules);
        let result = futures::executor::block_on(timed.execute(&transaction(dec!(1))));
        assert!(result.is_blocked());
        assert_eq!(result.blocking_rule.as_deref(), Some("ok (evaluation error)"));
    }

    #[tokio::test]
    async fn test_load_rules_from_config() {
        let mut executor = PolicyExecutor::new();
        let loaded = executor.load_rules_from_config(&[
            PolicyRecord::new("whitelist", "Whitelist", json!({})).with_priority(5),
            PolicyRecord::new("velocity", "Disabled", json!({})).with_active(false),
            PolicyRecord::new("gas_limit", "Unknown", json!({})),
            PolicyRecord::new("velocity", "Velocity", json!({ "max_daily_usd": 1000 })).with_priority(10),
        ]);

        assert_eq!(loaded, 2);
        let names: Vec<&str> = executor.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Velocity", "Whitelist"]);

        // Reloading replaces the previous rule list
        assert_eq!(executor.load_rules_from_config(&[]), 0);
        assert!(executor.rules().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_policy_blocks() {
        let mut executor = PolicyExecutor::new();
        executor.load_rules_from_config(&[PolicyRecord::new(
            "velocity",
            "Daily Limit",
            json!({ "max_daily_usd": "unlimited" }),
        )]);
        let result = executor.execute(&transaction(dec!(1))).await;

        assert!(result.is_blocked());
        assert_eq!(result.blocking_rule.as_deref(), Some("Daily Limit (evaluation error)"));
    }

    #[tokio::test]
    async fn test_velocity_2fa_with_new_address_warning() {
        let executor = PolicyExecutor::new().with_rules(vec![
            Arc::new(WhitelistRule::new("Whitelist", WhitelistConfig::default(), 5)) as Arc<dyn PolicyRule>,
            Arc::new(VelocityRule::new(
                "Velocity",
                VelocityConfig {
                    require_2fa_above_usd: Some(dec!(5000)),
                    ..VelocityConfig::default()
                },
                10,
            )) as Arc<dyn PolicyRule>,
        ]);
        let tx = transaction(dec!(10000)).with_address_flags(true, false);
        let result = executor.execute(&tx).await;

        assert_eq!(result.decision, Decision::Require2fa);
        assert_eq!(result.rules_evaluated, vec!["Velocity", "Whitelist"]);
        assert_eq!(result.required_actions, vec![TWO_FACTOR_ACTION.to_string()]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_execution_is_identical() {
        let mut executor = PolicyExecutor::new();
        executor.load_rules_from_config(&[
            PolicyRecord::new("velocity", "Velocity", json!({ "delay_hours_above_usd": 100 })),
            PolicyRecord::new("whitelist", "Whitelist", json!({ "quarantine_hours_for_new": 48 })),
        ]);
        let tx = transaction(dec!(500)).with_address_flags(true, false);

        let mut first = executor.execute(&tx).await;
        let mut second = executor.execute(&tx).await;
        first.evaluation_time_ms = 0.0;
        second.evaluation_time_ms = 0.0;

        assert_eq!(first, second);
        assert_eq!(first.delay_seconds, Some(48 * 3600));
        assert_eq!(first.blocking_rule.as_deref(), Some("Whitelist"));
    }

    #[tokio::test]
    async fn test_adding_a_blocking_rule_never_loosens() {
        let base = vec![
            scripted("a", 3, Behavior::Allow),
            Arc::new(WhitelistRule::new("w", WhitelistConfig::default(), 2)) as Arc<dyn PolicyRule>,
        ];
        let tx = transaction(dec!(1)).with_address_flags(true, false);

        let before = PolicyExecutor::new().with_rules(base.clone()).execute(&tx).await;
        let mut stricter = base;
        stricter.push(scripted("b", 1, Behavior::Block));
        let after = PolicyExecutor::new().with_rules(stricter).execute(&tx).await;

        assert!(after.decision >= before.decision);
        assert_eq!(after.decision, Decision::Block);
    }
}
