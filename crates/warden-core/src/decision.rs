//! Decision types
//!
//! `PolicyDecision` is what a single rule returns; `Decision` is the
//! totally ordered verdict the executor reduces those into.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Action token requesting a second factor
pub const TWO_FACTOR_ACTION: &str = "2fa_required";

/// Final verdict, ordered from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Warn,
    #[serde(rename = "require_2fa")]
    Require2fa,
    Delay,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Warn => "warn",
            Decision::Require2fa => "require_2fa",
            Decision::Delay => "delay",
            Decision::Block => "block",
        }
    }

    /// The transaction may eventually proceed
    pub fn permits(&self) -> bool {
        *self != Decision::Block
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Decision::Allow),
            "warn" => Ok(Decision::Warn),
            "require_2fa" => Ok(Decision::Require2fa),
            "delay" => Ok(Decision::Delay),
            "block" => Ok(Decision::Block),
            other => Err(CoreError::UnknownDecision(other.to_string())),
        }
    }
}

/// Outcome of evaluating one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// False blocks the transaction
    pub allowed: bool,

    /// A second factor must be presented
    #[serde(default)]
    pub require_2fa: bool,

    /// The transaction must wait this long before signing
    #[serde(default)]
    pub delay_seconds: Option<u64>,

    /// Human-readable advisories
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Action tokens the caller must complete
    #[serde(default)]
    pub required_actions: Vec<String>,

    /// Justification, for the audit trail
    #[serde(default)]
    pub reason: String,
}

impl Default for PolicyDecision {
    fn default() -> Self {
        Self {
            allowed: true,
            require_2fa: false,
            delay_seconds: None,
            warnings: Vec::new(),
            required_actions: Vec::new(),
            reason: String::new(),
        }
    }
}

impl PolicyDecision {
    /// Allow, optionally with warnings
    pub fn allow(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            ..Self::default()
        }
    }

    /// Block with a reason
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Allow after waiting `seconds`
    pub fn delay(seconds: u64, reason: impl Into<String>) -> Self {
        Self {
            delay_seconds: Some(seconds),
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Allow once the caller completes `action` (a second factor)
    pub fn require_verification(action: impl Into<String>) -> Self {
        Self {
            require_2fa: true,
            required_actions: vec![action.into()],
            ..Self::default()
        }
    }

    /// Append a warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Requested delay, ignoring zero-length waits
    pub fn effective_delay(&self) -> Option<u64> {
        self.delay_seconds.filter(|s| *s > 0)
    }

    /// This rule's own verdict on the restrictiveness order
    pub fn verdict(&self) -> Decision {
        if !self.allowed {
            Decision::Block
        } else if self.effective_delay().is_some() {
            Decision::Delay
        } else if self.require_2fa {
            Decision::Require2fa
        } else if !self.warnings.is_empty() {
            Decision::Warn
        } else {
            Decision::Allow
        }
    }
}
