//! PolicyEvaluator - main API for evaluating transactions

use crate::config::EvaluatorConfig;
use crate::error::{Result, SdkError};
use crate::types::{ApplicableLimits, BlockedWindow, EvaluationRequest};
use std::sync::Arc;
use warden_core::{
    short_address, ExecutionResult, PolicyContext, PolicyRecord, RuleKind, TransactionContext,
    UserTier,
};
use warden_runtime::{
    parse_config, PolicyExecutor, PolicyRule, RuleRegistry, TimelockConfig, VelocityConfig,
    WhitelistConfig,
};

/// Evaluates transactions against per-user policy sets
///
/// Each call builds a fresh executor from the request's policies, so one
/// evaluator can serve many users concurrently.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    registry: Arc<RuleRegistry>,
    config: EvaluatorConfig,
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyEvaluator {
    /// Create an evaluator with the built-in rule types
    pub fn new() -> Self {
        Self::with_config(EvaluatorConfig::default())
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self::from_parts(Arc::new(RuleRegistry::with_builtin_rules()), config)
    }

    pub(crate) fn from_parts(registry: Arc<RuleRegistry>, config: EvaluatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn builder() -> crate::builder::PolicyEvaluatorBuilder {
        crate::builder::PolicyEvaluatorBuilder::new()
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Build an executor loaded with the given policies
    pub fn executor_for(&self, policies: &[PolicyRecord]) -> PolicyExecutor {
        let mut executor = PolicyExecutor::with_registry(Arc::clone(&self.registry))
            .with_options(self.config.executor_options());
        executor.load_rules_from_config(policies);
        executor
    }

    /// Evaluate a transaction request against its policies
    ///
    /// Fails only for malformed requests. Rule failures are reported as a
    /// BLOCK result.
    pub async fn evaluate_transaction(&self, request: EvaluationRequest) -> Result<ExecutionResult> {
        if request.to_address.trim().is_empty() {
            return Err(SdkError::InvalidRequest("to_address must not be empty".to_string()));
        }
        let ctx = request.to_context(self.config.default_user_tier);
        ctx.transaction.validate()?;

        let executor = self.executor_for(&request.policies);
        let result = executor.execute_in_context(&ctx).await;
        self.log_summary(&ctx, &result);
        Ok(result)
    }

    /// Evaluate a prepared transaction context against `policies`
    pub async fn evaluate(
        &self,
        policies: &[PolicyRecord],
        tx: &TransactionContext,
    ) -> Result<ExecutionResult> {
        tx.validate()?;
        let ctx = PolicyContext::from_transaction(tx.clone());
        let result = self.executor_for(policies).execute_in_context(&ctx).await;
        self.log_summary(&ctx, &result);
        Ok(result)
    }

    fn log_summary(&self, ctx: &PolicyContext, result: &ExecutionResult) {
        tracing::info!(
            user_id = %ctx.transaction.user_id,
            to_address = %short_address(&ctx.transaction.to_address),
            decision = %result.decision,
            blocking_rule = ?result.blocking_rule,
            rules_evaluated = result.rules_evaluated.len(),
            "Transaction evaluation complete"
        );
    }

    /// Tightest limits across the active policies, for display
    ///
    /// Reads the records directly without evaluating anything. Records whose
    /// configuration does not parse are left out.
    pub fn get_applicable_limits(&self, policies: &[PolicyRecord]) -> ApplicableLimits {
        let mut limits = ApplicableLimits::default();

        for record in policies.iter().filter(|p| p.is_active) {
            match record.kind() {
                Some(RuleKind::Velocity) => {
                    let Some(config) = parse_or_skip::<VelocityConfig>(record) else {
                        continue;
                    };
                    tighten(&mut limits.daily_limit_usd, config.max_daily_usd);
                    tighten(&mut limits.per_tx_limit_usd, config.max_per_tx_usd);
                    tighten(&mut limits.requires_2fa_above_usd, config.require_2fa_above_usd);
                }
                Some(RuleKind::Timelock) => {
                    let Some(config) = parse_or_skip::<TimelockConfig>(record) else {
                        continue;
                    };
                    if let Some((start, end)) = config.window() {
                        limits.blocked_hours.push(BlockedWindow {
                            start,
                            end,
                            timezone: config.timezone,
                        });
                    }
                }
                Some(RuleKind::Whitelist) => {
                    let Some(config) = parse_or_skip::<WhitelistConfig>(record) else {
                        continue;
                    };
                    let stricter = limits
                        .whitelist_mode
                        .map_or(true, |current| config.mode.strictness() > current.strictness());
                    if stricter {
                        limits.whitelist_mode = Some(config.mode);
                    }
                }
                Some(RuleKind::Contract) | None => {}
            }
        }

        limits
    }

    /// Build the rule for a single record, failing on unknown types or
    /// unparseable configuration instead of deferring to evaluation
    pub fn build_rule(&self, record: &PolicyRecord) -> Result<Arc<dyn PolicyRule>> {
        let built = self.registry.build(record).ok_or_else(|| {
            SdkError::ConfigError(format!("Unknown rule_type: {}", record.rule_type))
        })?;
        Ok(built?)
    }

    /// Check a policy record before it is stored
    ///
    /// Returns configuration errors plus a tier error when `tier` may not
    /// use this kind of policy.
    pub fn validate_policy(&self, record: &PolicyRecord, tier: UserTier) -> Vec<String> {
        let mut errors = self.registry.validate_record(record);
        if !tier.allows_rule_type(&record.rule_type) {
            errors.push(format!(
                "Policy type '{}' requires a tier with advanced policies (current tier: {})",
                record.rule_type, tier
            ));
        }
        errors
    }
}

fn parse_or_skip<T: serde::de::DeserializeOwned>(record: &PolicyRecord) -> Option<T> {
    match parse_config(record) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(rule = record.effective_name(), error = %e, "Ignoring unparseable policy");
            None
        }
    }
}

/// Lower `current` to `candidate` when the candidate is a positive, smaller limit
fn tighten(current: &mut Option<rust_decimal::Decimal>, candidate: Option<rust_decimal::Decimal>) {
    if let Some(value) = candidate.filter(|v| v.is_sign_positive() && !v.is_zero()) {
        if current.map_or(true, |c| value < c) {
            *current = Some(value);
        }
    }
}
