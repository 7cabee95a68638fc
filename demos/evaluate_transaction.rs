//! Transaction evaluation example
//!
//! This example demonstrates:
//! - Loading a policy set from YAML
//! - Evaluating transactions through the PolicyEvaluator
//! - Reading the decision, attribution and audit trail
//!
//! Run from the workspace root:
//! `RUST_LOG=debug cargo run -p warden-sdk --example evaluate_transaction`

use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use warden_sdk::{EvaluationRequest, ExecutionResult, PolicyEvaluator, PolicySet};

fn print_result(label: &str, result: &ExecutionResult) {
    println!("{}:", label);
    println!("  Decision: {}", result.decision);
    if let Some(rule) = &result.blocking_rule {
        println!("  Deciding rule: {}", rule);
    }
    if let Some(seconds) = result.delay_seconds {
        println!("  Delay: {}s", seconds);
    }
    if let Some(reason) = &result.reason {
        println!("  Reason: {}", reason);
    }
    for warning in &result.warnings {
        println!("  Warning: {}", warning);
    }
    println!("  Rules evaluated: {:?}", result.rules_evaluated);
    println!("  Evaluation time: {:.3}ms\n", result.evaluation_time_ms);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Transaction Evaluation Example ===\n");

    let set = PolicySet::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/policies/treasury.yaml"))?;
    println!("Loaded policy set '{}' with {} policies\n", set.name, set.policies.len());

    let evaluator = PolicyEvaluator::new();
    let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f8fE89";
    let noon: chrono::DateTime<chrono::Utc> = "2024-01-10T12:00:00Z".parse()?;

    let small = EvaluationRequest::new("user123", "ethereum", address, Decimal::new(500, 0))
        .with_tier("humpback")
        .with_new_address(false)
        .with_time(noon)
        .with_policies(set.policies.clone());
    print_result("Small transfer to a known address", &evaluator.evaluate_transaction(small).await?);

    let large = EvaluationRequest::new("user123", "ethereum", address, Decimal::new(15_000, 0))
        .with_tier("humpback")
        .with_new_address(true)
        .with_time(noon)
        .with_policies(set.policies.clone());
    print_result("Large transfer to a new address", &evaluator.evaluate_transaction(large).await?);

    let over = EvaluationRequest::new("user123", "ethereum", address, Decimal::new(30_000, 0))
        .with_tier("humpback")
        .with_new_address(false)
        .with_time(noon)
        .with_policies(set.policies.clone());
    let result = evaluator.evaluate_transaction(over).await?;
    print_result("Transfer over the per-transaction limit", &result);

    println!("Audit trail (JSON):");
    println!("{}", serde_json::to_string_pretty(&result.trace)?);

    Ok(())
}
