//! Warden Core - Core types and definitions for the Warden policy engine
//!
//! This crate provides the value types shared across the Warden ecosystem:
//! - Transaction and evaluation contexts
//! - Per-rule decisions and the final execution result
//! - Policy configuration records and rule kinds
//! - Membership tiers
//! - Error types

pub mod context;
pub mod decision;
pub mod error;
pub mod policy;
pub mod result;
pub mod tier;

// Re-export commonly used types
pub use context::{PolicyContext, RecentTransaction, TransactionContext};
pub use decision::{Decision, PolicyDecision, TWO_FACTOR_ACTION};
pub use error::{CoreError, Result};
pub use policy::{PolicyRecord, RuleKind};
pub use result::{
    ExecutionResult, RuleTrace, DEFAULT_DELAY_SECONDS, DURESS_INTERCEPT, DURESS_WARNING,
};
pub use tier::{TierLimits, UserTier, ADVANCED_RULE_TYPES};

/// Shorten an address for logs and user-facing messages.
pub fn short_address(address: &str) -> String {
    match address.char_indices().nth(10) {
        Some((idx, _)) => format!("{}...", &address[..idx]),
        None => address.to_string(),
    }
}
