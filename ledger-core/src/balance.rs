//! Balance calculator
//!
//! Derives each participant's net position from the ledger records alone.
//! The computation is pure: no cached balance field is authoritative, and
//! calling it twice with no intervening mutation returns identical results.
//!
//! Sign convention: positive net = the member is owed money, negative net =
//! the member owes money.

use crate::{
    error::{Error, Result},
    storage::TripState,
    types::{cent_epsilon, round_money, UserId},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One member's aggregate position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBalance {
    /// Member
    pub user_id: UserId,

    /// Total paid via real expenses
    pub total_paid: Decimal,

    /// Total owed via splits
    pub total_owed: Decimal,

    /// `total_paid - total_owed`, adjusted by confirmed settlements
    pub net_balance: Decimal,
}

/// A member's net split into its manual and activity-driven components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceBreakdown {
    /// Member
    pub user_id: UserId,

    /// Full net position (matches [`calculate_balances`])
    pub net_balance: Decimal,

    /// Net over non-activity expenses, adjusted by confirmed settlements
    pub manual_net: Decimal,

    /// Net over activity-generated expenses
    pub prepaid_net: Decimal,

    /// Prepaid activities this member organizes that others still owe for
    pub prepaid_activities_owed: Vec<OutstandingActivity>,
}

/// A prepaid activity with outstanding third-party debt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingActivity {
    /// Activity ID
    pub activity_id: Uuid,

    /// Activity title
    pub title: String,

    /// Sum still owed to the organizer by other participants
    pub outstanding: Decimal,
}

/// Compute net balances for every involved user
///
/// Involved = current members, plus anyone who appears in the expense, split,
/// or settlement history. Non-members whose net is zero are dropped. Output
/// is sorted by user id. Amounts are rounded to minor units after each
/// aggregation step.
pub fn calculate_balances(state: &TripState) -> Vec<UserBalance> {
    let mut paid: BTreeMap<UserId, Decimal> = BTreeMap::new();
    let mut owed: BTreeMap<UserId, Decimal> = BTreeMap::new();

    for expense in state.expenses() {
        *paid.entry(expense.paid_by.clone()).or_insert(Decimal::ZERO) += expense.amount;
    }
    for split in state.splits() {
        *owed.entry(split.user_id.clone()).or_insert(Decimal::ZERO) += split.amount;
    }

    // Involved users: members first, then historical participants
    let mut involved: BTreeMap<UserId, ()> = BTreeMap::new();
    for member in state.members() {
        involved.insert(member.user_id.clone(), ());
    }
    for user in paid.keys().chain(owed.keys()) {
        involved.insert(user.clone(), ());
    }
    for settlement in state.settlements().filter(|s| s.is_confirmed()) {
        involved.insert(settlement.payer_id.clone(), ());
        involved.insert(settlement.payee_id.clone(), ());
    }

    let mut balances: BTreeMap<UserId, UserBalance> = involved
        .into_keys()
        .map(|user_id| {
            let total_paid = round_money(paid.get(&user_id).copied().unwrap_or(Decimal::ZERO));
            let total_owed = round_money(owed.get(&user_id).copied().unwrap_or(Decimal::ZERO));
            let net_balance = round_money(total_paid - total_owed);
            (
                user_id.clone(),
                UserBalance {
                    user_id,
                    total_paid,
                    total_owed,
                    net_balance,
                },
            )
        })
        .collect();

    // Confirmed settlements shift net positions: the payer recovers, the
    // payee's claim shrinks
    for settlement in state.settlements().filter(|s| s.is_confirmed()) {
        if let Some(balance) = balances.get_mut(&settlement.payer_id) {
            balance.net_balance = round_money(balance.net_balance + settlement.amount);
        }
        if let Some(balance) = balances.get_mut(&settlement.payee_id) {
            balance.net_balance = round_money(balance.net_balance - settlement.amount);
        }
    }

    balances
        .into_values()
        .filter(|b| state.is_member(&b.user_id) || !b.net_balance.is_zero())
        .collect()
}

/// Net balance of a single user (zero if uninvolved)
pub fn balance_for(state: &TripState, user_id: &UserId) -> UserBalance {
    calculate_balances(state)
        .into_iter()
        .find(|b| &b.user_id == user_id)
        .unwrap_or_else(|| UserBalance {
            user_id: user_id.clone(),
            total_paid: Decimal::ZERO,
            total_owed: Decimal::ZERO,
            net_balance: Decimal::ZERO,
        })
}

/// Split one member's net into manual and prepaid-activity components
///
/// Confirmed settlements are attributed to the manual component; the prepaid
/// component is pure expense-derived exposure, so the removal policy can
/// check the two independently.
pub fn breakdown_for(state: &TripState, user_id: &UserId) -> BalanceBreakdown {
    let mut manual_paid = Decimal::ZERO;
    let mut manual_owed = Decimal::ZERO;
    let mut prepaid_paid = Decimal::ZERO;
    let mut prepaid_owed = Decimal::ZERO;

    for expense in state.expenses() {
        if expense.paid_by == *user_id {
            if expense.is_activity_expense() {
                prepaid_paid += expense.amount;
            } else {
                manual_paid += expense.amount;
            }
        }
    }
    for split in state.splits() {
        if split.user_id == *user_id {
            let activity_linked = state
                .expense(split.expense_id)
                .map(|e| e.is_activity_expense())
                .unwrap_or(false);
            if activity_linked {
                prepaid_owed += split.amount;
            } else {
                manual_owed += split.amount;
            }
        }
    }

    let mut manual_net = round_money(round_money(manual_paid) - round_money(manual_owed));
    let prepaid_net = round_money(round_money(prepaid_paid) - round_money(prepaid_owed));

    for settlement in state.settlements().filter(|s| s.is_confirmed()) {
        if settlement.payer_id == *user_id {
            manual_net = round_money(manual_net + settlement.amount);
        }
        if settlement.payee_id == *user_id {
            manual_net = round_money(manual_net - settlement.amount);
        }
    }

    let prepaid_activities_owed = outstanding_organized_activities(state, user_id);

    BalanceBreakdown {
        user_id: user_id.clone(),
        net_balance: round_money(manual_net + prepaid_net),
        manual_net,
        prepaid_net,
        prepaid_activities_owed,
    }
}

/// Prepaid activities organized by the user where other participants still
/// owe unpaid shares
fn outstanding_organized_activities(
    state: &TripState,
    user_id: &UserId,
) -> Vec<OutstandingActivity> {
    let mut outstanding = Vec::new();

    for activity in state.activities() {
        if activity.created_by != *user_id || activity.payment.billable_cost().is_none() {
            continue;
        }

        let mut owed = Decimal::ZERO;
        for expense in state.expenses_for_activity(activity.activity_id) {
            for split in state.splits_for_expense(expense.expense_id) {
                if split.user_id != *user_id && !split.is_paid {
                    owed += split.amount;
                }
            }
        }

        if owed > Decimal::ZERO {
            outstanding.push(OutstandingActivity {
                activity_id: activity.activity_id,
                title: activity.title.clone(),
                outstanding: round_money(owed),
            });
        }
    }

    outstanding
}

/// Assert that the balances net to zero within tolerance
///
/// Tolerance is one minor unit per involved user, matching the per-split
/// rounding the calculator performs. Violations are refused, not returned as
/// truth.
pub fn verify_conservation(balances: &[UserBalance]) -> Result<()> {
    let total: Decimal = balances.iter().map(|b| b.net_balance).sum();
    let tolerance = cent_epsilon() * Decimal::from(balances.len().max(1) as i64);

    if total.abs() > tolerance {
        return Err(Error::InvariantViolation(format!(
            "Balances net to {} across {} users (tolerance {})",
            total,
            balances.len(),
            tolerance
        )));
    }

    Ok(())
}
