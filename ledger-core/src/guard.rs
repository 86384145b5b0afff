//! Integrity guard
//!
//! Gatekeeps mutation of ledger records and member removal. Two rules:
//!
//! 1. An expense (or an activity that owns expenses) cannot be edited or
//!    deleted once a terminal settlement younger than it exists - that
//!    settlement's amount may have been computed from the expense - or once
//!    any user it references has left the trip.
//! 2. A member can only be removed when the policy version stored on the
//!    trip says their position is clean.
//!
//! Violations surface as [`Error::Conflict`] with the blocking record and
//! numbers, never silently ignored.

use crate::{
    balance::{breakdown_for, BalanceBreakdown, OutstandingActivity},
    error::{Error, Result},
    storage::TripState,
    types::{RemovalPolicyVersion, UserId},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a removal-eligibility analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalAnalysis {
    /// Member under analysis
    pub user_id: UserId,

    /// Whether removal may proceed
    pub can_remove: bool,

    /// Why removal is blocked, if it is
    pub reason: Option<String>,

    /// Full net balance
    pub balance: Decimal,

    /// Net over non-activity expenses (plus confirmed settlements)
    pub manual_expense_balance: Decimal,

    /// Net over activity-generated expenses
    pub prepaid_activity_balance: Decimal,

    /// Prepaid activities the member organizes with outstanding debt
    pub prepaid_activities_owed: Vec<OutstandingActivity>,

    /// Suggested actions to unblock removal
    pub suggestions: Vec<String>,

    /// Policy version that produced this verdict
    pub policy: RemovalPolicyVersion,
}

/// Check that an expense may be edited or deleted
pub fn check_expense_mutable(state: &TripState, expense_id: Uuid) -> Result<()> {
    let expense = state
        .expense(expense_id)
        .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

    if let Some(settlement) = state.terminal_settlement_after(expense.created_at) {
        return Err(Error::Conflict(format!(
            "Expense '{}' ({} {}) predates settlement {} created {}; \
             settled history cannot be modified",
            expense.title,
            expense.amount,
            expense.currency,
            settlement.settlement_id,
            settlement.created_at
        )));
    }

    if !state.is_member(&expense.paid_by) {
        return Err(Error::Conflict(format!(
            "Expense '{}' was paid by {}, who is no longer a trip member",
            expense.title, expense.paid_by
        )));
    }

    for split in state.splits_for_expense(expense_id) {
        if !state.is_member(&split.user_id) {
            return Err(Error::Conflict(format!(
                "Expense '{}' has a {} {} share owed by {}, who is no longer a trip member",
                expense.title, split.amount, expense.currency, split.user_id
            )));
        }
    }

    Ok(())
}

/// Check that an activity and every expense it owns may be mutated
pub fn check_activity_mutable(state: &TripState, activity_id: Uuid) -> Result<()> {
    if state.activity(activity_id).is_none() {
        return Err(Error::ActivityNotFound(activity_id.to_string()));
    }

    for expense in state.expenses_for_activity(activity_id) {
        check_expense_mutable(state, expense.expense_id)?;
    }

    Ok(())
}

/// Analyze whether a member can be removed from the trip
///
/// The verdict is produced by the policy version stored on the trip, so
/// already-created trips keep the behavior they started with.
pub fn analyze_removal(state: &TripState, user_id: &UserId) -> Result<RemovalAnalysis> {
    if !state.is_member(user_id) {
        return Err(Error::MemberNotFound(user_id.to_string()));
    }

    let breakdown = breakdown_for(state, user_id);
    let version = state.settings().removal_policy;
    let verdict = policy_for(version).evaluate(&breakdown);

    let mut suggestions = Vec::new();
    if !verdict.can_remove {
        suggestions = build_suggestions(&breakdown, version);
    }

    Ok(RemovalAnalysis {
        user_id: user_id.clone(),
        can_remove: verdict.can_remove,
        reason: verdict.reason,
        balance: breakdown.net_balance,
        manual_expense_balance: breakdown.manual_net,
        prepaid_activity_balance: breakdown.prepaid_net,
        prepaid_activities_owed: breakdown.prepaid_activities_owed,
        suggestions,
        policy: version,
    })
}

/// Removal verdict from one policy version
struct Verdict {
    can_remove: bool,
    reason: Option<String>,
}

/// One version of the removal rules
///
/// Versions are strategy objects keyed by the per-trip flag; adding a new
/// version means adding a variant and a struct, not editing old behavior.
trait RemovalPolicy {
    fn evaluate(&self, breakdown: &BalanceBreakdown) -> Verdict;
}

fn policy_for(version: RemovalPolicyVersion) -> &'static dyn RemovalPolicy {
    match version {
        RemovalPolicyVersion::Legacy => &LegacyPolicy,
        RemovalPolicyVersion::SplitBalance => &SplitBalancePolicy,
    }
}

/// Original rule: any nonzero total balance blocks removal
struct LegacyPolicy;

impl RemovalPolicy for LegacyPolicy {
    fn evaluate(&self, breakdown: &BalanceBreakdown) -> Verdict {
        if !breakdown.net_balance.is_zero() {
            return Verdict {
                can_remove: false,
                reason: Some(format!(
                    "{} has a nonzero balance of {}",
                    breakdown.user_id, breakdown.net_balance
                )),
            };
        }

        Verdict {
            can_remove: true,
            reason: None,
        }
    }
}

/// Current rule: manual balance and organized-prepaid exposure are checked
/// independently; an attendee-side activity debt alone does not block
struct SplitBalancePolicy;

impl RemovalPolicy for SplitBalancePolicy {
    fn evaluate(&self, breakdown: &BalanceBreakdown) -> Verdict {
        if !breakdown.prepaid_activities_owed.is_empty() {
            let total: Decimal = breakdown
                .prepaid_activities_owed
                .iter()
                .map(|a| a.outstanding)
                .sum();
            return Verdict {
                can_remove: false,
                reason: Some(format!(
                    "{} organizes {} prepaid activit{} with {} still owed by other participants",
                    breakdown.user_id,
                    breakdown.prepaid_activities_owed.len(),
                    if breakdown.prepaid_activities_owed.len() == 1 {
                        "y"
                    } else {
                        "ies"
                    },
                    total
                )),
            };
        }

        if !breakdown.manual_net.is_zero() {
            return Verdict {
                can_remove: false,
                reason: Some(format!(
                    "{} has a nonzero manual expense balance of {}",
                    breakdown.user_id, breakdown.manual_net
                )),
            };
        }

        Verdict {
            can_remove: true,
            reason: None,
        }
    }
}

fn build_suggestions(
    breakdown: &BalanceBreakdown,
    version: RemovalPolicyVersion,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    for activity in &breakdown.prepaid_activities_owed {
        suggestions.push(format!(
            "Reassign or cancel prepaid activity '{}' ({} outstanding)",
            activity.title, activity.outstanding
        ));
    }

    let blocking = match version {
        RemovalPolicyVersion::Legacy => breakdown.net_balance,
        RemovalPolicyVersion::SplitBalance => breakdown.manual_net,
    };
    if blocking < Decimal::ZERO {
        suggestions.push(format!(
            "Member must pay back {} before leaving",
            blocking.abs()
        ));
    } else if blocking > Decimal::ZERO {
        suggestions.push(format!(
            "Group must settle {} owed to the member before removal",
            blocking
        ));
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::types::{
        Activity, Expense, ExpenseSplit, Member, MemberStatus, PaymentType, RsvpStatus,
        Settlement, SettlementStatus, TripSettings,
    };
    use chrono::Utc;

    fn seed_trip(storage: &Storage, policy: RemovalPolicyVersion) -> Uuid {
        let trip_id = Uuid::new_v4();
        storage
            .create_trip(TripSettings {
                trip_id,
                default_currency: "USD".to_string(),
                removal_policy: policy,
            })
            .unwrap();
        storage
            .mutate(trip_id, |state| {
                for user in ["alice", "bob", "carol"] {
                    state.upsert_member(Member {
                        trip_id,
                        user_id: UserId::new(user),
                        is_admin: user == "alice",
                        status: MemberStatus::Active,
                        rsvp_status: RsvpStatus::Going,
                    })?;
                }
                Ok(())
            })
            .unwrap();
        trip_id
    }

    fn manual_expense(storage: &Storage, trip_id: Uuid, paid_by: &str, shares: &[(&str, i64)]) {
        let total: i64 = shares.iter().map(|(_, c)| c).sum();
        let expense = Expense {
            expense_id: Uuid::now_v7(),
            trip_id,
            title: "Groceries".to_string(),
            amount: Decimal::new(total, 2),
            currency: "USD".to_string(),
            category: "food".to_string(),
            paid_by: UserId::new(paid_by),
            activity_id: None,
            is_settled: false,
            created_at: Utc::now(),
        };
        let expense_id = expense.expense_id;
        storage
            .mutate(trip_id, |state| {
                state.insert_expense(expense.clone())?;
                for (user, cents) in shares {
                    state.insert_split(ExpenseSplit {
                        split_id: Uuid::now_v7(),
                        expense_id,
                        user_id: UserId::new(*user),
                        amount: Decimal::new(*cents, 2),
                        is_paid: *user == paid_by,
                    })?;
                }
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_expense_blocked_after_settlement() {
        let storage = Storage::new();
        let trip_id = seed_trip(&storage, RemovalPolicyVersion::SplitBalance);

        manual_expense(&storage, trip_id, "alice", &[("alice", 3000), ("bob", 3000)]);

        let expense_id = storage
            .read(trip_id, |state| {
                Ok(state.expenses().next().unwrap().expense_id)
            })
            .unwrap();

        // Rejected settlements protect history too: they prove a settlement
        // round happened after the expense existed
        storage
            .mutate(trip_id, |state| {
                state.insert_settlement(Settlement {
                    settlement_id: Uuid::now_v7(),
                    trip_id,
                    payer_id: UserId::new("bob"),
                    payee_id: UserId::new("alice"),
                    amount: Decimal::new(3000, 2),
                    currency: "USD".to_string(),
                    status: SettlementStatus::Rejected,
                    payment_method: None,
                    payment_link: None,
                    created_at: Utc::now() + chrono::Duration::seconds(1),
                    confirmed_at: None,
                    rejected_at: Some(Utc::now()),
                    resolved_by: Some(UserId::new("alice")),
                })
            })
            .unwrap();

        let result = storage.read(trip_id, |state| check_expense_mutable(state, expense_id));
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_expense_blocked_when_split_user_left() {
        let storage = Storage::new();
        let trip_id = seed_trip(&storage, RemovalPolicyVersion::SplitBalance);

        manual_expense(&storage, trip_id, "alice", &[("alice", 1000), ("bob", 1000)]);
        let expense_id = storage
            .read(trip_id, |state| {
                Ok(state.expenses().next().unwrap().expense_id)
            })
            .unwrap();

        storage
            .mutate(trip_id, |state| {
                state.remove_member(&UserId::new("bob")).map(|_| ())
            })
            .unwrap();

        let result = storage.read(trip_id, |state| check_expense_mutable(state, expense_id));
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_legacy_policy_blocks_any_balance() {
        let storage = Storage::new();
        let trip_id = seed_trip(&storage, RemovalPolicyVersion::Legacy);

        manual_expense(&storage, trip_id, "alice", &[("alice", 2000), ("bob", 2000)]);

        let analysis = storage
            .read(trip_id, |state| analyze_removal(state, &UserId::new("bob")))
            .unwrap();

        assert!(!analysis.can_remove);
        assert_eq!(analysis.balance, Decimal::new(-2000, 2));
        assert!(!analysis.suggestions.is_empty());

        // carol has no history at all: free to go
        let analysis = storage
            .read(trip_id, |state| analyze_removal(state, &UserId::new("carol")))
            .unwrap();
        assert!(analysis.can_remove);
    }

    #[test]
    fn test_split_policy_ignores_attendee_side_activity_debt() {
        let storage = Storage::new();
        let trip_id = seed_trip(&storage, RemovalPolicyVersion::SplitBalance);

        // bob owes $15 for alice's activity but has a clean manual slate
        let activity_id = Uuid::new_v4();
        storage
            .mutate(trip_id, |state| {
                state.upsert_activity(Activity {
                    activity_id,
                    trip_id,
                    title: "Wine tasting".to_string(),
                    created_by: UserId::new("alice"),
                    payment: PaymentType::PrepaidPerPerson {
                        cost: Decimal::new(1500, 2),
                    },
                })?;
                let expense = Expense {
                    expense_id: Uuid::now_v7(),
                    trip_id,
                    title: "Wine tasting".to_string(),
                    amount: Decimal::new(1500, 2),
                    currency: "USD".to_string(),
                    category: "activities".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: Some(activity_id),
                    is_settled: false,
                    created_at: Utc::now(),
                };
                let expense_id = expense.expense_id;
                state.insert_expense(expense)?;
                state.insert_split(ExpenseSplit {
                    split_id: Uuid::now_v7(),
                    expense_id,
                    user_id: UserId::new("bob"),
                    amount: Decimal::new(1500, 2),
                    is_paid: false,
                })?;
                Ok(())
            })
            .unwrap();

        // bob: attendee-side debt only, removable under the split policy
        let analysis = storage
            .read(trip_id, |state| analyze_removal(state, &UserId::new("bob")))
            .unwrap();
        assert!(analysis.can_remove, "{:?}", analysis.reason);
        assert_eq!(analysis.prepaid_activity_balance, Decimal::new(-1500, 2));

        // alice: organizes the activity with $15 outstanding, blocked
        let analysis = storage
            .read(trip_id, |state| analyze_removal(state, &UserId::new("alice")))
            .unwrap();
        assert!(!analysis.can_remove);
        assert_eq!(analysis.prepaid_activities_owed.len(), 1);
        assert!(analysis.suggestions[0].contains("Wine tasting"));
    }

    #[test]
    fn test_policy_versions_differ_on_same_facts() {
        // Same position, both policies: attendee-side activity debt
        for (policy, expect_removable) in [
            (RemovalPolicyVersion::Legacy, false),
            (RemovalPolicyVersion::SplitBalance, true),
        ] {
            let storage = Storage::new();
            let trip_id = seed_trip(&storage, policy);
            let activity_id = Uuid::new_v4();

            storage
                .mutate(trip_id, |state| {
                    state.upsert_activity(Activity {
                        activity_id,
                        trip_id,
                        title: "Boat".to_string(),
                        created_by: UserId::new("alice"),
                        payment: PaymentType::Prepaid {
                            cost: Decimal::new(3000, 2),
                        },
                    })?;
                    let expense = Expense {
                        expense_id: Uuid::now_v7(),
                        trip_id,
                        title: "Boat".to_string(),
                        amount: Decimal::new(3000, 2),
                        currency: "USD".to_string(),
                        category: "activities".to_string(),
                        paid_by: UserId::new("alice"),
                        activity_id: Some(activity_id),
                        is_settled: false,
                        created_at: Utc::now(),
                    };
                    let expense_id = expense.expense_id;
                    state.insert_expense(expense)?;
                    state.insert_split(ExpenseSplit {
                        split_id: Uuid::now_v7(),
                        expense_id,
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(3000, 2),
                        is_paid: false,
                    })?;
                    Ok(())
                })
                .unwrap();

            let analysis = storage
                .read(trip_id, |state| analyze_removal(state, &UserId::new("bob")))
                .unwrap();
            assert_eq!(analysis.can_remove, expect_removable, "policy {:?}", policy);
        }
    }
}
