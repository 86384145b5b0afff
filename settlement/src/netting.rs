//! Debt simplification algorithm
//!
//! Reduces a set of net balances to the minimum number of payments that
//! zero out every balance.
//!
//! # Algorithm
//!
//! 1. Partition members into debtors (negative net) and creditors (positive)
//! 2. Match the largest debtor with the largest creditor
//! 3. Transfer `min(|debtor|, creditor)`, which fully clears at least one
//!    of the two
//! 4. Drop cleared balances, repeat until none remain
//!
//! Ties on the extreme balance break by user id, so identical inputs always
//! produce identical plans.
//!
//! # Example
//!
//! ```text
//! Net balances:
//!   alice: +60  (is owed)
//!   bob:   -30  (owes)
//!   carol: -30  (owes)
//!
//! Plan:
//!   bob   pays alice 30
//!   carol pays alice 30
//!
//! Two payments instead of the pairwise worst case of three.
//! ```

use crate::{
    types::{PlanStats, SettlementPlan, SettlementTransaction},
    Error, Result,
};
use ledger_core::types::{cent_epsilon, round_money};
use ledger_core::{UserBalance, UserId};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Settlement optimizer
#[derive(Debug, Clone)]
pub struct SettlementOptimizer {
    /// Balances within this distance of zero count as settled
    epsilon: Decimal,
}

impl Default for SettlementOptimizer {
    fn default() -> Self {
        Self {
            epsilon: cent_epsilon(),
        }
    }
}

impl SettlementOptimizer {
    /// Create an optimizer with the default cent epsilon
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an optimizer with a custom epsilon
    pub fn with_epsilon(epsilon: Decimal) -> Self {
        Self { epsilon }
    }

    /// Compute the minimal transaction plan for the given balances
    ///
    /// Balances must net to zero within one epsilon per participant;
    /// anything further out is malformed input, not optimizable drift.
    pub fn optimize(&self, balances: &[UserBalance]) -> Result<SettlementPlan> {
        let total: Decimal = balances.iter().map(|b| b.net_balance).sum();
        let tolerance = self.epsilon * Decimal::from(balances.len().max(1) as i64);
        if total.abs() > tolerance {
            return Err(Error::Netting(format!(
                "Balances net to {} across {} users (tolerance {}); refusing to plan",
                total,
                balances.len(),
                tolerance
            )));
        }

        // A single cent is still a debt: anything at or beyond epsilon
        // participates, anything strictly inside is settled dust
        let mut debtors: Vec<(UserId, Decimal)> = balances
            .iter()
            .filter(|b| b.net_balance <= -self.epsilon)
            .map(|b| (b.user_id.clone(), -b.net_balance))
            .collect();
        let mut creditors: Vec<(UserId, Decimal)> = balances
            .iter()
            .filter(|b| b.net_balance >= self.epsilon)
            .map(|b| (b.user_id.clone(), b.net_balance))
            .collect();

        let mut transactions = Vec::new();

        while !debtors.is_empty() && !creditors.is_empty() {
            let di = extreme_index(&debtors);
            let ci = extreme_index(&creditors);

            let amount = round_money(debtors[di].1.min(creditors[ci].1));
            if amount <= Decimal::ZERO {
                break;
            }

            transactions.push(SettlementTransaction {
                from: debtors[di].0.clone(),
                to: creditors[ci].0.clone(),
                amount,
            });

            debtors[di].1 -= amount;
            creditors[ci].1 -= amount;

            if debtors[di].1 < self.epsilon {
                debtors.swap_remove(di);
            }
            if creditors[ci].1 < self.epsilon {
                creditors.swap_remove(ci);
            }
        }

        let is_valid = self.validate(balances, &transactions).is_ok();
        if !is_valid {
            tracing::warn!(
                transactions = transactions.len(),
                "Settlement plan failed its own validation"
            );
        }

        let stats = Self::stats_of(&transactions);

        tracing::debug!(
            transactions = stats.transaction_count,
            total = %stats.total_amount,
            users = stats.user_count,
            "Settlement plan computed"
        );

        Ok(SettlementPlan {
            transactions,
            stats,
            is_valid,
        })
    }

    /// Replay transactions over the balances and assert they all zero out
    ///
    /// Used as a correctness self-check on every plan, never silently
    /// trusted.
    pub fn validate(
        &self,
        balances: &[UserBalance],
        transactions: &[SettlementTransaction],
    ) -> Result<()> {
        let mut residual: BTreeMap<UserId, Decimal> = balances
            .iter()
            .map(|b| (b.user_id.clone(), b.net_balance))
            .collect();

        for transaction in transactions {
            if transaction.amount <= Decimal::ZERO {
                return Err(Error::InvariantViolation(format!(
                    "Transaction {} -> {} has non-positive amount {}",
                    transaction.from, transaction.to, transaction.amount
                )));
            }

            // Paying lifts the payer toward zero, receiving burns down the
            // receiver's claim
            match residual.get_mut(&transaction.from) {
                Some(balance) => *balance += transaction.amount,
                None => {
                    return Err(Error::InvariantViolation(format!(
                        "Transaction payer {} is not among the balances",
                        transaction.from
                    )))
                }
            }
            match residual.get_mut(&transaction.to) {
                Some(balance) => *balance -= transaction.amount,
                None => {
                    return Err(Error::InvariantViolation(format!(
                        "Transaction payee {} is not among the balances",
                        transaction.to
                    )))
                }
            }
        }

        for (user_id, remaining) in residual {
            if remaining.abs() > self.epsilon {
                return Err(Error::InvariantViolation(format!(
                    "{} still has a residual balance of {} after the plan",
                    user_id, remaining
                )));
            }
        }

        Ok(())
    }

    /// Summarize a transaction list
    pub fn stats_of(transactions: &[SettlementTransaction]) -> PlanStats {
        let total_amount: Decimal = transactions.iter().map(|t| t.amount).sum();
        let users: BTreeSet<&UserId> = transactions
            .iter()
            .flat_map(|t| [&t.from, &t.to])
            .collect();
        let average_amount = if transactions.is_empty() {
            Decimal::ZERO
        } else {
            round_money(total_amount / Decimal::from(transactions.len() as i64))
        };

        PlanStats {
            transaction_count: transactions.len(),
            total_amount,
            user_count: users.len(),
            average_amount,
        }
    }

    /// The optimized transactions where the given member pays or receives
    pub fn recommendations_for(
        &self,
        balances: &[UserBalance],
        user_id: &UserId,
    ) -> Result<Vec<SettlementTransaction>> {
        let plan = self.optimize(balances)?;

        Ok(plan
            .transactions
            .into_iter()
            .filter(|t| t.from == *user_id || t.to == *user_id)
            .collect())
    }
}

/// Index of the largest remaining amount, ties broken by smallest user id
fn extreme_index(entries: &[(UserId, Decimal)]) -> usize {
    entries
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(i, _)| i)
        .expect("extreme_index called on empty slice")
}
