//! Policy rules
//!
//! Every rule is a named, prioritized unit of policy logic behind the
//! `PolicyRule` trait. Rules are stateless: `evaluate` reads only the
//! context and the rule's fixed configuration, so one instance can serve
//! many concurrent evaluations.

mod contract;
mod misconfigured;
mod timelock;
mod velocity;
mod whitelist;

pub use contract::{ContractConfig, ContractRule};
pub use misconfigured::MisconfiguredRule;
pub use timelock::{TimelockConfig, TimelockRule};
pub use velocity::{VelocityConfig, VelocityRule};
pub use whitelist::{WhitelistConfig, WhitelistMode, WhitelistRule};

use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use std::fmt;
use warden_core::{PolicyContext, PolicyDecision, PolicyRecord};

/// A configured unit of policy logic
///
/// Disallowing a transaction is a normal outcome expressed as
/// `PolicyDecision::block`. `Err` is reserved for broken configuration or
/// internal failures, and makes the executor fail closed.
#[async_trait]
pub trait PolicyRule: Send + Sync + fmt::Debug {
    /// Rule name, used for attribution and the audit trail
    fn name(&self) -> &str;

    /// Registry key of the rule type (e.g., "velocity")
    fn kind(&self) -> &str;

    /// Evaluation priority (higher = first)
    fn priority(&self) -> i32;

    /// Evaluate the transaction against this rule
    async fn evaluate(&self, ctx: &PolicyContext) -> Result<PolicyDecision>;

    /// Check the configuration, returning one message per problem
    fn validate_config(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Rules that can be built from a policy record
pub trait FromRecord: Sized {
    fn from_record(record: &PolicyRecord) -> Result<Self>;
}

/// Deserialize a record's config map into a typed configuration
pub fn parse_config<T: DeserializeOwned>(record: &PolicyRecord) -> Result<T> {
    let value = if record.config.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        record.config.clone()
    };
    serde_json::from_value(value)
        .map_err(|e| RuntimeError::invalid_config(record.effective_name(), e.to_string()))
}

/// Format a USD amount as `$1,234.50`
pub(crate) fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_usd(dec!(999.5)), "$999.50");
        assert_eq!(format_usd(dec!(25000)), "$25,000.00");
        assert_eq!(format_usd(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_usd(dec!(-1500)), "-$1,500.00");
    }

    #[test]
    fn test_parse_config_null_is_empty() {
        let record = PolicyRecord::new("velocity", "v", serde_json::Value::Null);
        let config: VelocityConfig = parse_config(&record).unwrap();
        assert_eq!(config, VelocityConfig::default());
    }
}
