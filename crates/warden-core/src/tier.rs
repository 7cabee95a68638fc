//! Membership tiers

use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule types that require a tier with advanced policies
pub const ADVANCED_RULE_TYPES: [&str; 3] = ["timelock", "chain", "duress"];

/// Membership tier, in ascending privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    Orca,
    Humpback,
    Blue,
}

/// Limits granted by a tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLimits {
    /// None means unlimited
    pub daily_tx_limit_usd: Option<Decimal>,
    pub advanced_policies: bool,
}

impl UserTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserTier::Orca => "orca",
            UserTier::Humpback => "humpback",
            UserTier::Blue => "blue",
        }
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            UserTier::Orca => TierLimits {
                daily_tx_limit_usd: Some(Decimal::from(10_000)),
                advanced_policies: false,
            },
            UserTier::Humpback => TierLimits {
                daily_tx_limit_usd: Some(Decimal::from(500_000)),
                advanced_policies: true,
            },
            UserTier::Blue => TierLimits {
                daily_tx_limit_usd: None,
                advanced_policies: true,
            },
        }
    }

    /// Whether this tier may configure policies of `rule_type`
    pub fn allows_rule_type(&self, rule_type: &str) -> bool {
        self.limits().advanced_policies || !ADVANCED_RULE_TYPES.contains(&rule_type)
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orca" => Ok(UserTier::Orca),
            "humpback" => Ok(UserTier::Humpback),
            "blue" => Ok(UserTier::Blue),
            _ => Err(CoreError::UnknownTier(s.to_string())),
        }
    }
}
