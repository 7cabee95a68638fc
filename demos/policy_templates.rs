//! Policy templates example
//!
//! Lists the built-in templates with their effective limits and checks
//! which of them each membership tier may apply.

use warden_sdk::{builtin_templates, PolicyEvaluator, UserTier};

fn main() {
    let evaluator = PolicyEvaluator::new();

    for template in builtin_templates() {
        println!("=== {} ===", template.name);
        println!("{}\n", template.description);

        let limits = evaluator.get_applicable_limits(&template.policies);
        println!("  Daily limit: {:?}", limits.daily_limit_usd);
        println!("  Per-tx limit: {:?}", limits.per_tx_limit_usd);
        println!("  2FA above: {:?}", limits.requires_2fa_above_usd);
        println!("  Blocked hours: {:?}", limits.blocked_hours);
        println!("  Whitelist mode: {:?}", limits.whitelist_mode);

        for tier in [UserTier::Orca, UserTier::Humpback, UserTier::Blue] {
            let problems: Vec<String> = template
                .policies
                .iter()
                .flat_map(|record| evaluator.validate_policy(record, tier))
                .collect();
            if problems.is_empty() {
                println!("  {}: available", tier);
            } else {
                println!("  {}: {}", tier, problems.join("; "));
            }
        }
        println!();
    }
}
