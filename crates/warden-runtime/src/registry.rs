//! Rule registry - maps rule_type keys to constructors

use crate::error::Result;
use crate::rules::{
    ContractRule, FromRecord, MisconfiguredRule, PolicyRule, TimelockRule, VelocityRule,
    WhitelistRule,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use warden_core::{PolicyRecord, RuleKind};

/// Builds a rule instance from a policy record
pub type RuleFactory = fn(&PolicyRecord) -> Result<Arc<dyn PolicyRule>>;

fn factory<R>(record: &PolicyRecord) -> Result<Arc<dyn PolicyRule>>
where
    R: FromRecord + PolicyRule + 'static,
{
    Ok(Arc::new(R::from_record(record)?))
}

/// Registry of rule types available for dynamic instantiation
///
/// Read-only after setup, so one registry can be shared between executors.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in rule types
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(RuleKind::Velocity.as_str(), factory::<VelocityRule>);
        registry.register(RuleKind::Whitelist.as_str(), factory::<WhitelistRule>);
        registry.register(RuleKind::Timelock.as_str(), factory::<TimelockRule>);
        registry.register(RuleKind::Contract.as_str(), factory::<ContractRule>);
        registry
    }

    /// Register a rule type, replacing any existing factory for the key
    pub fn register(&mut self, rule_type: impl Into<String>, factory: RuleFactory) {
        let rule_type = rule_type.into();
        tracing::debug!(rule_type = %rule_type, "Registered rule type");
        self.factories.insert(rule_type, factory);
    }

    /// Register a rule type implementing `FromRecord`
    pub fn register_type<R>(&mut self, rule_type: impl Into<String>)
    where
        R: FromRecord + PolicyRule + 'static,
    {
        self.register(rule_type, factory::<R>);
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.factories.contains_key(rule_type)
    }

    /// Registered keys, sorted
    pub fn rule_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Instantiate the rule for a record
    ///
    /// Returns `None` for unregistered types. A record whose configuration
    /// cannot be parsed yields a [`MisconfiguredRule`] that fails on
    /// evaluation.
    pub fn instantiate(&self, record: &PolicyRecord) -> Option<Arc<dyn PolicyRule>> {
        match self.build(record)? {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::error!(
                    rule = record.effective_name(),
                    rule_type = %record.rule_type,
                    error = %e,
                    "Failed to parse rule configuration"
                );
                Some(Arc::new(MisconfiguredRule::new(
                    record.effective_name(),
                    record.rule_type.clone(),
                    record.priority,
                    e,
                )))
            }
        }
    }

    /// Build the rule for a record, surfacing configuration errors
    ///
    /// Returns `None` for unregistered types.
    pub fn build(&self, record: &PolicyRecord) -> Option<Result<Arc<dyn PolicyRule>>> {
        self.factories.get(&record.rule_type).map(|factory| factory(record))
    }

    /// Check a record before it is stored, returning one message per problem
    pub fn validate_record(&self, record: &PolicyRecord) -> Vec<String> {
        let Some(built) = self.build(record) else {
            return vec![format!("Unknown rule_type: {}", record.rule_type)];
        };
        match built {
            Ok(rule) => rule.validate_config(),
            Err(e) => vec![e.to_string()],
        }
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rule_types", &self.rule_types())
            .finish()
    }
}
