//! Contract interaction rule (`chain` rule type)

use super::{parse_config, FromRecord, PolicyRule};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::{short_address, PolicyContext, PolicyDecision, PolicyRecord, RuleKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Only apply to transactions on this chain
    #[serde(default)]
    pub chain: Option<String>,

    #[serde(default = "default_block_unverified")]
    pub block_unverified_contracts: bool,

    /// Functions that may be called; None permits any function
    #[serde(default)]
    pub allowed_functions: Option<Vec<String>>,
}

fn default_block_unverified() -> bool {
    true
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            chain: None,
            block_unverified_contracts: default_block_unverified(),
            allowed_functions: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContractRule {
    name: String,
    priority: i32,
    config: ContractConfig,
}

impl ContractRule {
    pub fn new(name: impl Into<String>, config: ContractConfig, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            config,
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    fn applies_to(&self, chain: &str) -> bool {
        self.config
            .chain
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(chain))
    }
}

impl FromRecord for ContractRule {
    fn from_record(record: &PolicyRecord) -> Result<Self> {
        Ok(Self::new(
            record.effective_name(),
            parse_config(record)?,
            record.priority,
        ))
    }
}

#[async_trait]
impl PolicyRule for ContractRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RuleKind::Contract.as_str()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn evaluate(&self, ctx: &PolicyContext) -> Result<PolicyDecision> {
        let tx = &ctx.transaction;

        if !tx.is_contract_call || !self.applies_to(&tx.chain) {
            return Ok(PolicyDecision::allow(Vec::new()));
        }

        let contract = short_address(&tx.to_address);

        if !tx.contract_verified {
            if self.config.block_unverified_contracts {
                tracing::info!(rule = %self.name, contract = %contract, "Contract rule: unverified contract blocked");
                return Ok(PolicyDecision::block(format!(
                    "Interaction with unverified contract {} is not allowed",
                    contract
                )));
            }
            return Ok(PolicyDecision::allow(vec![format!(
                "Contract {} is not verified",
                contract
            )]));
        }

        if let Some(allowed) = &self.config.allowed_functions {
            let function = tx.function_name.as_deref().unwrap_or("");
            if !allowed.iter().any(|f| f == function) {
                let shown = if function.is_empty() { "<unknown>" } else { function };
                tracing::info!(rule = %self.name, function = %shown, "Contract rule: function not allowed");
                return Ok(PolicyDecision::block(format!(
                    "Function '{}' is not in the allowed list for contract calls",
                    shown
                )));
            }
        }

        Ok(PolicyDecision::allow(Vec::new()))
    }

    fn validate_config(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if matches!(&self.config.chain, Some(c) if c.trim().is_empty()) {
            errors.push("chain must not be empty".to_string());
        }
        if let Some(functions) = &self.config.allowed_functions {
            if functions.iter().any(|f| f.trim().is_empty()) {
                errors.push("allowed_functions entries must not be empty".to_string());
            }
        }
        errors
    }
}
