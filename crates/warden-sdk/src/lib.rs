//! Warden Policy Engine SDK
//!
//! High-level API for evaluating transactions against user policy sets.

pub mod builder;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::PolicyEvaluatorBuilder;
pub use config::{EvaluatorConfig, PolicySet};
pub use error::{Result, SdkError};
pub use evaluator::PolicyEvaluator;
pub use templates::{builtin_templates, find_template, PolicyTemplate};
pub use types::{ApplicableLimits, BlockedWindow, EvaluationRequest};

// Re-export commonly used types from dependencies
pub use warden_core::{
    Decision, ExecutionResult, PolicyDecision, PolicyRecord, RuleTrace, TransactionContext,
    UserTier, DURESS_WARNING, TWO_FACTOR_ACTION,
};
pub use warden_runtime::{PolicyExecutor, PolicyRule, RuleRegistry, WhitelistMode};
