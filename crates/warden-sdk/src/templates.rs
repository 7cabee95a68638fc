//! Built-in policy templates
//!
//! Recommended starting profiles that users can apply and then customize.

use serde::{Deserialize, Serialize};
use serde_json::json;
use warden_core::PolicyRecord;

/// A named, recommended set of policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTemplate {
    pub name: String,
    pub description: String,
    pub policies: Vec<PolicyRecord>,
}

impl PolicyTemplate {
    fn new(name: &str, description: &str, policies: Vec<PolicyRecord>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            policies,
        }
    }
}

/// All built-in templates
pub fn builtin_templates() -> Vec<PolicyTemplate> {
    vec![
        PolicyTemplate::new(
            "Conservative HNWI",
            "Maximum security for large portfolios",
            vec![
                PolicyRecord::new(
                    "velocity",
                    "Daily Limit",
                    json!({ "max_daily_usd": 50000, "require_2fa_above_usd": 5000 }),
                )
                .with_priority(10),
                PolicyRecord::new(
                    "timelock",
                    "Night Lock",
                    json!({ "block_start_hour": 22, "block_end_hour": 7 }),
                )
                .with_priority(20),
                PolicyRecord::new(
                    "whitelist",
                    "Known Addresses Only",
                    json!({ "mode": "block_unknown", "quarantine_hours_for_new": 48 }),
                )
                .with_priority(30),
            ],
        ),
        PolicyTemplate::new(
            "Active Trader",
            "Balanced security for frequent transactions",
            vec![
                PolicyRecord::new(
                    "velocity",
                    "Daily Limit",
                    json!({ "max_daily_usd": 200000, "require_2fa_above_usd": 25000 }),
                )
                .with_priority(10),
                PolicyRecord::new(
                    "chain",
                    "Verified Contracts",
                    json!({ "block_unverified_contracts": true }),
                )
                .with_priority(20),
            ],
        ),
        PolicyTemplate::new(
            "Cold Storage",
            "Ultra-paranoid long-term holding",
            vec![
                PolicyRecord::new(
                    "velocity",
                    "Daily Limit",
                    json!({ "max_daily_usd": 10000, "delay_hours_above_usd": 24 }),
                )
                .with_priority(10),
                PolicyRecord::new("timelock", "No Weekends", json!({ "block_weekends": true }))
                    .with_priority(20),
                PolicyRecord::new("whitelist", "Known Addresses Only", json!({ "mode": "block_unknown" }))
                    .with_priority(30),
            ],
        ),
    ]
}

/// Look up a built-in template by name (case-insensitive)
pub fn find_template(name: &str) -> Option<PolicyTemplate> {
    builtin_templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}
