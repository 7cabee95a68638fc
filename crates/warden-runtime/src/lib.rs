//! Warden Runtime - Rule implementations and execution engine
//!
//! This crate turns policy records into rule instances, runs them against a
//! transaction and reduces their decisions into one `ExecutionResult`.

pub mod aggregate;
pub mod error;
pub mod executor;
pub mod registry;
pub mod rules;

// Re-export main types
pub use aggregate::{aggregate_decisions, RuleOutcome};
pub use error::{Result, RuntimeError};
pub use executor::{ExecutorBuilder, ExecutorOptions, PolicyExecutor};
pub use registry::{RuleFactory, RuleRegistry};
pub use rules::{
    parse_config, ContractConfig, ContractRule, FromRecord, MisconfiguredRule, PolicyRule, TimelockConfig,
    TimelockRule, VelocityConfig, VelocityRule, WhitelistConfig, WhitelistMode, WhitelistRule,
};
