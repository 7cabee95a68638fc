//! Whitelist rule
//!
//! Controls which destinations a user can send to. Whitelisted
//! destinations always pass; new destinations are either blocked or
//! allowed with a warning plus an optional quarantine or second factor.

use super::{parse_config, FromRecord, PolicyRule};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{
    short_address, PolicyContext, PolicyDecision, PolicyRecord, RuleKind, TWO_FACTOR_ACTION,
};

/// How new, non-whitelisted destinations are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistMode {
    /// Refuse transfers to addresses outside the whitelist
    BlockUnknown,
    /// Allow with a warning
    #[default]
    WarnUnknown,
}

impl WhitelistMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhitelistMode::BlockUnknown => "block_unknown",
            WhitelistMode::WarnUnknown => "warn_unknown",
        }
    }

    /// Strictness rank, higher is stricter
    pub fn strictness(&self) -> u8 {
        match self {
            WhitelistMode::WarnUnknown => 0,
            WhitelistMode::BlockUnknown => 1,
        }
    }
}

impl fmt::Display for WhitelistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub mode: WhitelistMode,

    #[serde(default)]
    pub require_2fa_for_new: bool,

    /// Waiting period for first transfers to a new address
    #[serde(default)]
    pub quarantine_hours_for_new: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct WhitelistRule {
    name: String,
    priority: i32,
    config: WhitelistConfig,
}

impl WhitelistRule {
    pub fn new(name: impl Into<String>, config: WhitelistConfig, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            config,
        }
    }

    pub fn config(&self) -> &WhitelistConfig {
        &self.config
    }
}

impl FromRecord for WhitelistRule {
    fn from_record(record: &PolicyRecord) -> Result<Self> {
        Ok(Self::new(
            record.effective_name(),
            parse_config(record)?,
            record.priority,
        ))
    }
}

#[async_trait]
impl PolicyRule for WhitelistRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RuleKind::Whitelist.as_str()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn evaluate(&self, ctx: &PolicyContext) -> Result<PolicyDecision> {
        let tx = &ctx.transaction;

        if ctx.destination_whitelisted() {
            return Ok(PolicyDecision::allow(Vec::new()));
        }

        let address = short_address(&tx.to_address);

        if !tx.is_new_address {
            return Ok(PolicyDecision::allow(vec![
                "Consider adding frequently used addresses to your whitelist".to_string(),
            ]));
        }

        match self.config.mode {
            WhitelistMode::BlockUnknown => {
                tracing::info!(rule = %self.name, address = %address, "Whitelist rule: unknown address blocked");
                Ok(PolicyDecision::block(format!(
                    "Address {} is not in your whitelist. Add it to whitelist first.",
                    address
                )))
            }
            WhitelistMode::WarnUnknown => {
                let warning = format!("This is a new address not in your whitelist: {}", address);

                if let Some(hours) = self.config.quarantine_hours_for_new.filter(|h| *h > 0) {
                    tracing::info!(
                        rule = %self.name,
                        address = %address,
                        quarantine_hours = hours,
                        "Whitelist rule: new address quarantined"
                    );
                    return Ok(PolicyDecision::delay(
                        hours.saturating_mul(3600),
                        format!("New address requires {}h quarantine", hours),
                    )
                    .with_warning(warning));
                }

                if self.config.require_2fa_for_new {
                    tracing::info!(rule = %self.name, address = %address, "Whitelist rule: 2FA for new address");
                    return Ok(PolicyDecision::require_verification(TWO_FACTOR_ACTION)
                        .with_warning(warning)
                        .with_reason("2FA required for new address"));
                }

                Ok(PolicyDecision::allow(vec![warning]))
            }
        }
    }
}
