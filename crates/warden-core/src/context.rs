//! Evaluation contexts - the inputs rules are evaluated against

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Facts about the transaction being evaluated.
///
/// Historical aggregates (`daily_outflow_usd`, `is_new_address`,
/// `address_in_whitelist`) are computed by the caller from transaction
/// history; the engine never derives them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    /// Target network (e.g., "ethereum", "solana")
    pub chain: String,

    /// Destination address
    pub to_address: String,

    /// Amount in the chain's native unit
    #[serde(default)]
    pub value_native: Decimal,

    /// Amount in USD
    pub value_usd: Decimal,

    /// User initiating the transaction
    #[serde(default)]
    pub user_id: String,

    /// Membership tier (orca, humpback, blue, ...)
    #[serde(default = "default_tier")]
    pub user_tier: String,

    /// USD already sent by this user in the trailing 24 hours
    #[serde(default)]
    pub daily_outflow_usd: Decimal,

    /// Destination has never received a successful transaction from this user
    #[serde(default = "default_true")]
    pub is_new_address: bool,

    /// Destination is in the user's approved list
    #[serde(default)]
    pub address_in_whitelist: bool,

    /// Evaluation timestamp
    #[serde(default = "Utc::now")]
    pub current_time: DateTime<Utc>,

    /// Account is operating under coercion-detection mode
    #[serde(default)]
    pub duress_mode_active: bool,

    /// Transaction calls a contract
    #[serde(default)]
    pub is_contract_call: bool,

    /// Called contract has verified source
    #[serde(default)]
    pub contract_verified: bool,

    /// Called function, if known
    #[serde(default)]
    pub function_name: Option<String>,
}

fn default_tier() -> String {
    "orca".to_string()
}

fn default_true() -> bool {
    true
}

impl TransactionContext {
    /// Create a new transaction context with conservative defaults
    pub fn new(chain: impl Into<String>, to_address: impl Into<String>, value_usd: Decimal) -> Self {
        Self {
            chain: chain.into(),
            to_address: to_address.into(),
            value_native: Decimal::ZERO,
            value_usd,
            user_id: String::new(),
            user_tier: default_tier(),
            daily_outflow_usd: Decimal::ZERO,
            is_new_address: true,
            address_in_whitelist: false,
            current_time: Utc::now(),
            duress_mode_active: false,
            is_contract_call: false,
            contract_verified: false,
            function_name: None,
        }
    }

    /// Set the user identity and tier
    pub fn with_user(mut self, user_id: impl Into<String>, user_tier: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self.user_tier = user_tier.into();
        self
    }

    /// Set the native amount
    pub fn with_value_native(mut self, value: Decimal) -> Self {
        self.value_native = value;
        self
    }

    /// Set the trailing 24h outflow
    pub fn with_daily_outflow(mut self, outflow_usd: Decimal) -> Self {
        self.daily_outflow_usd = outflow_usd;
        self
    }

    /// Set address history flags
    pub fn with_address_flags(mut self, is_new: bool, in_whitelist: bool) -> Self {
        self.is_new_address = is_new;
        self.address_in_whitelist = in_whitelist;
        self
    }

    /// Set the evaluation time
    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.current_time = time;
        self
    }

    /// Mark duress mode
    pub fn with_duress(mut self, active: bool) -> Self {
        self.duress_mode_active = active;
        self
    }

    /// Describe a contract interaction
    pub fn with_contract_call(mut self, verified: bool, function_name: Option<String>) -> Self {
        self.is_contract_call = true;
        self.contract_verified = verified;
        self.function_name = function_name;
        self
    }

    /// Reject contexts whose monetary amounts are negative
    pub fn validate(&self) -> Result<()> {
        if self.value_usd < Decimal::ZERO {
            return Err(CoreError::InvalidValue(format!(
                "value_usd must not be negative (got {})",
                self.value_usd
            )));
        }
        if self.daily_outflow_usd < Decimal::ZERO {
            return Err(CoreError::InvalidValue(format!(
                "daily_outflow_usd must not be negative (got {})",
                self.daily_outflow_usd
            )));
        }
        Ok(())
    }
}

/// A prior transaction made available to rules needing history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    pub to_address: String,
    pub value_usd: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper passed to every rule during one executor run.
///
/// All rules in a single execution observe the same context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyContext {
    /// Transaction under evaluation
    pub transaction: TransactionContext,

    /// Membership tier of the user
    pub user_tier: String,

    /// Evaluation timestamp
    pub current_time: DateTime<Utc>,

    /// Recent history, for rules that need more than the scalar aggregates
    #[serde(default)]
    pub recent_transactions: Vec<RecentTransaction>,

    /// The user's approved destinations
    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl PolicyContext {
    /// Build a context from a transaction, copying tier and time from it
    pub fn from_transaction(transaction: TransactionContext) -> Self {
        Self {
            user_tier: transaction.user_tier.clone(),
            current_time: transaction.current_time,
            transaction,
            recent_transactions: Vec::new(),
            whitelist: Vec::new(),
        }
    }

    /// Attach recent transactions
    pub fn with_recent_transactions(mut self, recent: Vec<RecentTransaction>) -> Self {
        self.recent_transactions = recent;
        self
    }

    /// Attach the user's whitelist
    pub fn with_whitelist(mut self, whitelist: Vec<String>) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Whether the destination is approved, by flag or by list membership
    pub fn destination_whitelisted(&self) -> bool {
        let to = &self.transaction.to_address;
        self.transaction.address_in_whitelist || self.whitelist.iter().any(|a| same_address(a, to))
    }
}

fn is_hex_address(address: &str) -> bool {
    match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Hex addresses compare case-insensitively (EIP-55 checksum casing);
/// base58 and other encodings are case-sensitive
fn same_address(a: &str, b: &str) -> bool {
    if is_hex_address(a) && is_hex_address(b) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}
