//! Request and response types for PolicyEvaluator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use warden_core::{PolicyContext, PolicyRecord, RecentTransaction, TransactionContext, UserTier};
use warden_runtime::WhitelistMode;

/// One evaluation call: the user's policies plus the transaction facts
///
/// Historical aggregates (`daily_outflow_usd`, `is_new_address`) are
/// computed by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub user_id: String,

    /// Membership tier; the evaluator's default applies when absent
    #[serde(default)]
    pub user_tier: Option<String>,

    #[serde(default)]
    pub policies: Vec<PolicyRecord>,

    pub chain: String,

    pub to_address: String,

    pub value_usd: Decimal,

    /// Native-unit amount; zero when the caller does not convert
    #[serde(default)]
    pub value_native: Decimal,

    #[serde(default)]
    pub daily_outflow_usd: Decimal,

    #[serde(default = "default_true")]
    pub is_new_address: bool,

    /// Defaults to `!is_new_address` when absent
    #[serde(default)]
    pub address_in_whitelist: Option<bool>,

    #[serde(default)]
    pub is_contract_call: bool,

    #[serde(default)]
    pub contract_verified: bool,

    #[serde(default)]
    pub function_name: Option<String>,

    #[serde(default)]
    pub duress_mode: bool,

    /// Evaluation time; now when absent
    #[serde(default)]
    pub current_time: Option<DateTime<Utc>>,

    /// The user's whitelisted addresses, when the caller has them
    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default)]
    pub recent_transactions: Vec<RecentTransaction>,
}

fn default_true() -> bool {
    true
}

impl EvaluationRequest {
    /// Create a request for a transfer to a new, non-whitelisted address
    pub fn new(
        user_id: impl Into<String>,
        chain: impl Into<String>,
        to_address: impl Into<String>,
        value_usd: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_tier: None,
            policies: Vec::new(),
            chain: chain.into(),
            to_address: to_address.into(),
            value_usd,
            value_native: Decimal::ZERO,
            daily_outflow_usd: Decimal::ZERO,
            is_new_address: true,
            address_in_whitelist: None,
            is_contract_call: false,
            contract_verified: false,
            function_name: None,
            duress_mode: false,
            current_time: None,
            whitelist: Vec::new(),
            recent_transactions: Vec::new(),
        }
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.user_tier = Some(tier.into());
        self
    }

    pub fn with_policies(mut self, policies: Vec<PolicyRecord>) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_daily_outflow(mut self, outflow_usd: Decimal) -> Self {
        self.daily_outflow_usd = outflow_usd;
        self
    }

    /// Mark the destination as known or new
    pub fn with_new_address(mut self, is_new: bool) -> Self {
        self.is_new_address = is_new;
        self
    }

    pub fn with_whitelisted(mut self, in_whitelist: bool) -> Self {
        self.address_in_whitelist = Some(in_whitelist);
        self
    }

    pub fn with_contract_call(mut self, verified: bool, function_name: Option<String>) -> Self {
        self.is_contract_call = true;
        self.contract_verified = verified;
        self.function_name = function_name;
        self
    }

    pub fn with_duress(mut self, active: bool) -> Self {
        self.duress_mode = active;
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.current_time = Some(time);
        self
    }

    /// Build the evaluation context
    pub fn to_context(&self, default_tier: UserTier) -> PolicyContext {
        let tier = self
            .user_tier
            .clone()
            .unwrap_or_else(|| default_tier.as_str().to_string());

        let mut tx = TransactionContext::new(&self.chain, &self.to_address, self.value_usd)
            .with_user(&self.user_id, tier)
            .with_value_native(self.value_native)
            .with_daily_outflow(self.daily_outflow_usd)
            .with_address_flags(
                self.is_new_address,
                self.address_in_whitelist.unwrap_or(!self.is_new_address),
            )
            .with_duress(self.duress_mode);
        if let Some(time) = self.current_time {
            tx = tx.with_time(time);
        }
        if self.is_contract_call {
            tx = tx.with_contract_call(self.contract_verified, self.function_name.clone());
        }

        PolicyContext::from_transaction(tx)
            .with_whitelist(self.whitelist.clone())
            .with_recent_transactions(self.recent_transactions.clone())
    }
}

/// A timelock window, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedWindow {
    pub start: u32,
    pub end: u32,
    pub timezone: String,
}

/// Effective limits across a user's active policies, for display
///
/// `None` means no limit of that kind is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicableLimits {
    pub daily_limit_usd: Option<Decimal>,
    pub per_tx_limit_usd: Option<Decimal>,
    pub requires_2fa_above_usd: Option<Decimal>,
    pub blocked_hours: Vec<BlockedWindow>,
    pub whitelist_mode: Option<WhitelistMode>,
}
