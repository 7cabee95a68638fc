//! Timelock rule
//!
//! Blocks transactions during configured hours of the day and, optionally,
//! on weekends. Hours are evaluated in the configured IANA timezone.

use super::{parse_config, FromRecord, PolicyRule};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use warden_core::{PolicyContext, PolicyDecision, PolicyRecord, RuleKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockConfig {
    /// First blocked hour (0-23)
    #[serde(default)]
    pub block_start_hour: Option<u32>,

    /// Hour the block lifts (0-23); a value below the start wraps past midnight
    #[serde(default)]
    pub block_end_hour: Option<u32>,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub block_weekends: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            block_start_hour: None,
            block_end_hour: None,
            timezone: default_timezone(),
            block_weekends: false,
        }
    }
}

impl TimelockConfig {
    /// Blocked window as `(start, end)` when both bounds are set
    pub fn window(&self) -> Option<(u32, u32)> {
        self.block_start_hour.zip(self.block_end_hour)
    }
}

#[derive(Debug, Clone)]
pub struct TimelockRule {
    name: String,
    priority: i32,
    config: TimelockConfig,
    /// None when the configured name is not a known timezone
    tz: Option<Tz>,
}

impl TimelockRule {
    pub fn new(name: impl Into<String>, config: TimelockConfig, priority: i32) -> Self {
        let tz = config.timezone.parse::<Tz>().ok();
        Self {
            name: name.into(),
            priority,
            config,
            tz,
        }
    }

    pub fn config(&self) -> &TimelockConfig {
        &self.config
    }

    fn resolve_timezone(&self) -> Tz {
        match self.tz {
            Some(tz) => tz,
            None => {
                tracing::warn!(
                    rule = %self.name,
                    timezone = %self.config.timezone,
                    "Invalid timezone, using UTC"
                );
                Tz::UTC
            }
        }
    }
}

/// Whether `hour` falls in the blocked window, handling overnight windows
fn in_blocked_window(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        start <= hour && hour < end
    } else {
        hour >= start || hour < end
    }
}

fn hours_until_unblocked(hour: u32, end: u32) -> u32 {
    if end > hour {
        end - hour
    } else {
        24 - hour + end
    }
}

impl FromRecord for TimelockRule {
    fn from_record(record: &PolicyRecord) -> Result<Self> {
        Ok(Self::new(
            record.effective_name(),
            parse_config(record)?,
            record.priority,
        ))
    }
}

#[async_trait]
impl PolicyRule for TimelockRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        RuleKind::Timelock.as_str()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn evaluate(&self, ctx: &PolicyContext) -> Result<PolicyDecision> {
        let local = ctx.current_time.with_timezone(&self.resolve_timezone());
        let hour = local.hour();

        if self.config.block_weekends && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            tracing::info!(rule = %self.name, day = %local.weekday(), "Timelock rule: weekend block");
            return Ok(PolicyDecision::block(
                "Transactions are blocked on weekends. Try again on Monday.",
            ));
        }

        if let Some((start, end)) = self.config.window() {
            if in_blocked_window(hour, start, end) {
                tracing::info!(
                    rule = %self.name,
                    current_hour = hour,
                    block_start = start,
                    block_end = end,
                    "Timelock rule: hour block"
                );
                return Ok(PolicyDecision::block(format!(
                    "Transactions are blocked between {}:00 and {}:00 ({}). Try again in ~{} hours.",
                    start,
                    end,
                    self.config.timezone,
                    hours_until_unblocked(hour, end)
                )));
            }
        }

        Ok(PolicyDecision::allow(Vec::new()))
    }

    fn validate_config(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if matches!(self.config.block_start_hour, Some(h) if h > 23) {
            errors.push("block_start_hour must be 0-23".to_string());
        }
        if matches!(self.config.block_end_hour, Some(h) if h > 23) {
            errors.push("block_end_hour must be 0-23".to_string());
        }
        if self.config.block_start_hour.is_some() != self.config.block_end_hour.is_some() {
            errors.push(
                "block_start_hour and block_end_hour must both be set or both be unset".to_string(),
            );
        }
        if self.tz.is_none() {
            errors.push(format!("Invalid timezone: {}", self.config.timezone));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use warden_core::TransactionContext;

    fn rule(config: serde_json::Value) -> TimelockRule {
        let record = PolicyRecord::new("timelock", "Night Lock", config);
        TimelockRule::from_record(&record).unwrap()
    }

    fn at(time: DateTime<Utc>) -> PolicyContext {
        let tx = TransactionContext::new("ethereum", "0xabc", dec!(100)).with_time(time);
        PolicyContext::from_transaction(tx)
    }

    // 2024-01-10 is a Wednesday, 2024-01-13 a Saturday
    fn wednesday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_window_membership() {
        assert!(in_blocked_window(9, 9, 17));
        assert!(!in_blocked_window(17, 9, 17));
        assert!(in_blocked_window(23, 22, 6));
        assert!(in_blocked_window(3, 22, 6));
        assert!(!in_blocked_window(6, 22, 6));
        assert!(!in_blocked_window(12, 22, 6));
    }

    #[test]
    fn test_hours_until_unblocked() {
        assert_eq!(hours_until_unblocked(3, 6), 3);
        assert_eq!(hours_until_unblocked(23, 6), 7);
        assert_eq!(hours_until_unblocked(6, 6), 24);
    }

    #[tokio::test]
    async fn test_overnight_block() {
        let night = rule(json!({ "block_start_hour": 22, "block_end_hour": 6 }));

        let decision = night.evaluate(&at(wednesday(23))).await.unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("22:00 and 6:00 (UTC)"));
        assert!(decision.reason.contains("~7 hours"));

        let decision = night.evaluate(&at(wednesday(12))).await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_timezone_conversion() {
        // 15:30 UTC is 10:30 in New York during winter
        let office = rule(json!({
            "block_start_hour": 9,
            "block_end_hour": 17,
            "timezone": "America/New_York"
        }));
        let decision = office.evaluate(&at(wednesday(15))).await.unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("America/New_York"));

        // 03:30 UTC is 22:30 the previous evening in New York
        let decision = office.evaluate(&at(wednesday(3))).await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_weekend_block() {
        let weekends = rule(json!({ "block_weekends": true }));

        let saturday = Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).unwrap();
        let decision = weekends.evaluate(&at(saturday)).await.unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("Monday"));

        let decision = weekends.evaluate(&at(wednesday(12))).await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_weekend_uses_local_day() {
        // Friday 23:30 UTC is already Saturday in Tokyo
        let friday_night = Utc.with_ymd_and_hms(2024, 1, 12, 23, 30, 0).unwrap();
        let tokyo = rule(json!({ "block_weekends": true, "timezone": "Asia/Tokyo" }));

        let decision = tokyo.evaluate(&at(friday_night)).await.unwrap();
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_invalid_timezone_falls_back_to_utc() {
        let broken = rule(json!({
            "block_start_hour": 22,
            "block_end_hour": 6,
            "timezone": "Mars/Olympus_Mons"
        }));

        let decision = broken.evaluate(&at(wednesday(23))).await.unwrap();
        assert!(!decision.allowed);
        assert!(broken.validate_config()[0].contains("Mars/Olympus_Mons"));
    }

    #[tokio::test]
    async fn test_single_bound_is_ignored() {
        let half = rule(json!({ "block_start_hour": 0 }));
        let decision = half.evaluate(&at(wednesday(3))).await.unwrap();

        assert!(decision.allowed);
        assert_eq!(half.validate_config().len(), 1);
    }

    #[test]
    fn test_validate_config() {
        assert!(rule(json!({ "block_start_hour": 22, "block_end_hour": 6 }))
            .validate_config()
            .is_empty());

        let errors = rule(json!({ "block_start_hour": 24, "block_end_hour": 30 })).validate_config();
        assert_eq!(errors.len(), 2);
    }
}
