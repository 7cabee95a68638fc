//! Builder pattern for PolicyEvaluator

use crate::config::EvaluatorConfig;
use crate::evaluator::PolicyEvaluator;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use warden_core::UserTier;
use warden_runtime::{FromRecord, PolicyRule, RuleFactory, RuleRegistry};

/// Builder for PolicyEvaluator
///
/// # Example
///
/// ```rust,ignore
/// use warden_sdk::PolicyEvaluatorBuilder;
///
/// let evaluator = PolicyEvaluatorBuilder::new()
///     .with_rule_timeout(Duration::from_millis(250))
///     .register_rule_type::<GasLimitRule>("gas_limit")
///     .build();
/// ```
pub struct PolicyEvaluatorBuilder {
    config: EvaluatorConfig,
    registry: RuleRegistry,
}

impl Default for PolicyEvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyEvaluatorBuilder {
    /// Create a builder with the built-in rule types
    pub fn new() -> Self {
        Self {
            config: EvaluatorConfig::new(),
            registry: RuleRegistry::with_builtin_rules(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a YAML file
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.config = EvaluatorConfig::from_file(path)?;
        Ok(self)
    }

    /// Bound each rule evaluation
    pub fn with_rule_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_rule_timeout(timeout);
        self
    }

    /// Tier assumed when a request does not name one
    pub fn with_default_user_tier(mut self, tier: UserTier) -> Self {
        self.config = self.config.with_default_user_tier(tier);
        self
    }

    /// Replace the rule registry
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a custom rule type
    pub fn register_rule_type<R>(mut self, rule_type: impl Into<String>) -> Self
    where
        R: FromRecord + PolicyRule + 'static,
    {
        self.registry.register_type::<R>(rule_type);
        self
    }

    /// Register a custom rule factory
    pub fn register_factory(mut self, rule_type: impl Into<String>, factory: RuleFactory) -> Self {
        self.registry.register(rule_type, factory);
        self
    }

    pub fn build(self) -> PolicyEvaluator {
        tracing::debug!(
            rule_types = ?self.registry.rule_types(),
            rule_timeout_ms = ?self.config.rule_timeout_ms,
            "Building policy evaluator"
        );
        PolicyEvaluator::from_parts(Arc::new(self.registry), self.config)
    }
}
