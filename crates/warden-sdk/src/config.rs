//! Configuration types for PolicyEvaluator

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use warden_core::{PolicyRecord, UserTier};
use warden_runtime::ExecutorOptions;

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Upper bound on a single rule evaluation, in milliseconds
    #[serde(default)]
    pub rule_timeout_ms: Option<u64>,

    /// Tier assumed when a request does not name one
    #[serde(default = "default_tier")]
    pub default_user_tier: UserTier,
}

fn default_tier() -> UserTier {
    UserTier::Orca
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorConfig {
    /// Create a configuration with no rule timeout and the orca tier
    pub fn new() -> Self {
        Self {
            rule_timeout_ms: None,
            default_user_tier: default_tier(),
        }
    }

    /// Set the per-rule timeout
    pub fn with_rule_timeout(mut self, timeout: Duration) -> Self {
        self.rule_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the default tier
    pub fn with_default_user_tier(mut self, tier: UserTier) -> Self {
        self.default_user_tier = tier;
        self
    }

    /// Parse from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rule_timeout_ms == Some(0) {
            return Err(SdkError::ConfigError(
                "rule_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Executor options derived from this configuration
    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            rule_timeout: self.rule_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// A named list of policy records, as exported by the host application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub policies: Vec<PolicyRecord>,
}

impl PolicySet {
    pub fn new(name: impl Into<String>, policies: Vec<PolicyRecord>) -> Self {
        Self {
            name: name.into(),
            policies,
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let set = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(SdkError::ConfigError(format!(
                    "Unsupported policy file format: {}",
                    path.display()
                )))
            }
        };

        tracing::info!(
            path = %path.display(),
            name = %set.name,
            policies = set.policies.len(),
            "Loaded policy set"
        );
        Ok(set)
    }

    /// Active records only
    pub fn active(&self) -> impl Iterator<Item = &PolicyRecord> {
        self.policies.iter().filter(|p| p.is_active)
    }
}
