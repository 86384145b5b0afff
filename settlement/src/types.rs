//! Core types for settlement planning

use ledger_core::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One suggested payment between two members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    /// Member who pays
    pub from: UserId,

    /// Member who receives
    pub to: UserId,

    /// Amount to transfer
    pub amount: Decimal,
}

/// Statistics over a settlement plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStats {
    /// Number of transactions
    pub transaction_count: usize,

    /// Total amount moved
    pub total_amount: Decimal,

    /// Distinct members involved
    pub user_count: usize,

    /// Average transaction size
    pub average_amount: Decimal,
}

/// Minimal set of payments that drives every balance to zero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Suggested payments, deterministic for identical inputs
    pub transactions: Vec<SettlementTransaction>,

    /// Plan statistics
    pub stats: PlanStats,

    /// Whether replaying the plan over the input balances zeroed them
    ///
    /// Set by running the validation check, not assumed.
    pub is_valid: bool,
}

impl SettlementPlan {
    /// Empty plan for already-settled balances
    pub fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            stats: PlanStats {
                transaction_count: 0,
                total_amount: Decimal::ZERO,
                user_count: 0,
                average_amount: Decimal::ZERO,
            },
            is_valid: true,
        }
    }
}
