//! Policy configuration records

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Spending limits
    Velocity,
    /// Destination control
    Whitelist,
    /// Time-of-day and weekend restrictions
    Timelock,
    /// Contract interaction restrictions
    #[serde(rename = "chain")]
    Contract,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Velocity,
        RuleKind::Whitelist,
        RuleKind::Timelock,
        RuleKind::Contract,
    ];

    /// Registry key for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Velocity => "velocity",
            RuleKind::Whitelist => "whitelist",
            RuleKind::Timelock => "timelock",
            RuleKind::Contract => "chain",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownRuleType(s.to_string()))
    }
}

/// One configured policy, as stored by the surrounding application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Registry key (e.g., "velocity")
    pub rule_type: String,

    /// Human-readable name; falls back to `rule_type` when empty
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Rule-specific configuration
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,

    /// Higher runs first
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_active() -> bool {
    true
}

impl PolicyRecord {
    /// Create an active record with priority 0
    pub fn new(rule_type: impl Into<String>, name: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            rule_type: rule_type.into(),
            name: name.into(),
            description: None,
            config,
            priority: 0,
            is_active: true,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name used for the rule instance
    pub fn effective_name(&self) -> &str {
        if self.name.is_empty() {
            &self.rule_type
        } else {
            &self.name
        }
    }

    /// Built-in kind of this record, if recognized
    pub fn kind(&self) -> Option<RuleKind> {
        self.rule_type.parse().ok()
    }
}
