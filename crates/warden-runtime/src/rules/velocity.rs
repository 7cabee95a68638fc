//! Velocity limit rule
//!
//! Enforces spending limits:
//! - Maximum per-transaction amount
//! - Maximum daily outflow
//! - Time delays for large amounts
//! - 2FA requirements above a threshold

use super::{format_usd, parse_config, FromRecord, PolicyRule};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use warden_core::{PolicyContext, PolicyDecision, PolicyRecord, RuleKind, TWO_FACTOR_ACTION};

/// Velocity rule configuration. Absent limits mean "no limit".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityConfig {
    #[serde(default)]
    pub max_daily_usd: Option<Decimal>,

    #[serde(default)]
    pub max_per_tx_usd: Option<Decimal>,

    #[serde(default)]
    pub require_2fa_above_usd: Option<Decimal>,

    #[serde(default)]
    pub delay_hours_above_usd: Option<Decimal>,

    /// Delay applied above `delay_hours_above_usd`
    #[serde(default = "default_delay_hours")]
    pub delay_hours: u64,
}

fn default_delay_hours() -> u64 {
    24
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            max_daily_usd: None,
            max_per_tx_usd: None,
            require_2fa_above_usd: None,
            delay_hours_above_usd: None,
            delay_hours: default_delay_hours(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VelocityRule {
    name: String,
    priority: i32,
    config: VelocityConfig,
}

impl VelocityRule {
    pub fn new(name: impl Into<String>, config: VelocityConfig, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            config,
        }
    }

    pub fn config(&self) -> &VelocityConfig {
        &self.config
    }
}

impl FromRecord for VelocityRule {
    fn from_record(record: &PolicyRecord) -> Result<Self> {
        Ok(Self::new(
            record.effective_name(),
            parse_config(record)?,
            record.priority,
        ))
    }
}

#[async_trait]
impl PolicyRule for VelocityRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RuleKind::Velocity.as_str()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn evaluate(&self, ctx: &PolicyContext) -> Result<PolicyDecision> {
        let tx = &ctx.transaction;

        // Remaining allowance when the daily cap would be exceeded; an
        // overflowing total counts as over the cap
        let daily_overrun = self.config.max_daily_usd.and_then(|max_daily| {
            let exceeded = tx
                .daily_outflow_usd
                .checked_add(tx.value_usd)
                .map_or(true, |projected| projected > max_daily);
            exceeded.then(|| {
                max_daily
                    .checked_sub(tx.daily_outflow_usd)
                    .unwrap_or(Decimal::ZERO)
                    .max(Decimal::ZERO)
            })
        });

        if let Some(max_per_tx) = self.config.max_per_tx_usd {
            if tx.value_usd > max_per_tx {
                tracing::info!(
                    rule = %self.name,
                    value_usd = %tx.value_usd,
                    limit_usd = %max_per_tx,
                    "Velocity rule: per-tx limit exceeded"
                );
                let mut reason = format!(
                    "Transaction amount {} exceeds per-transaction limit of {}",
                    format_usd(tx.value_usd),
                    format_usd(max_per_tx)
                );
                if let Some(remaining) = daily_overrun {
                    reason.push_str(&format!(
                        " and would exceed daily limit (remaining today: {})",
                        format_usd(remaining)
                    ));
                }
                return Ok(PolicyDecision::block(reason));
            }
        }

        if let Some(remaining) = daily_overrun {
            tracing::info!(
                rule = %self.name,
                daily_outflow_usd = %tx.daily_outflow_usd,
                value_usd = %tx.value_usd,
                remaining_usd = %remaining,
                "Velocity rule: daily limit exceeded"
            );
            return Ok(PolicyDecision::block(format!(
                "Transaction would exceed daily limit. Remaining today: {}",
                format_usd(remaining)
            )));
        }

        if let Some(threshold) = self.config.delay_hours_above_usd {
            if tx.value_usd > threshold {
                let hours = self.config.delay_hours;
                tracing::info!(
                    rule = %self.name,
                    value_usd = %tx.value_usd,
                    threshold_usd = %threshold,
                    delay_hours = hours,
                    "Velocity rule: delay required"
                );
                return Ok(PolicyDecision::delay(
                    hours.saturating_mul(3600),
                    format!(
                        "Transactions above {} require a {}-hour delay",
                        format_usd(threshold),
                        hours
                    ),
                ));
            }
        }

        if let Some(threshold) = self.config.require_2fa_above_usd {
            if tx.value_usd > threshold {
                tracing::info!(
                    rule = %self.name,
                    value_usd = %tx.value_usd,
                    threshold_usd = %threshold,
                    "Velocity rule: 2FA required"
                );
                return Ok(PolicyDecision::require_verification(TWO_FACTOR_ACTION).with_reason(
                    format!("Transactions above {} require 2FA", format_usd(threshold)),
                ));
            }
        }

        Ok(PolicyDecision::allow(Vec::new()))
    }

    fn validate_config(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let limits = [
            ("max_daily_usd", self.config.max_daily_usd),
            ("max_per_tx_usd", self.config.max_per_tx_usd),
            ("require_2fa_above_usd", self.config.require_2fa_above_usd),
            ("delay_hours_above_usd", self.config.delay_hours_above_usd),
        ];
        for (key, value) in limits {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                errors.push(format!("{} must be positive", key));
            }
        }
        if self.config.delay_hours == 0 {
            errors.push("delay_hours must be positive".to_string());
        }
        errors
    }
}
