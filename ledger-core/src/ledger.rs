//! Main ledger orchestration layer
//!
//! Ties together storage, balance computation, the integrity guard, and the
//! split recalculator into a high-level API for trip cost sharing.
//!
//! # Example
//!
//! ```
//! use ledger_core::{Config, Ledger};
//! use uuid::Uuid;
//!
//! fn main() -> ledger_core::Result<()> {
//!     let ledger = Ledger::open(Config::default());
//!     let trip_id = Uuid::new_v4();
//!     ledger.create_trip(trip_id, None, None)?;
//!     // register members, record expenses, read balances...
//!     Ok(())
//! }
//! ```

use crate::{
    balance::{self, UserBalance},
    config::Config,
    error::{Error, Result},
    guard::{self, RemovalAnalysis},
    participation::SplitRecalculator,
    storage::Storage,
    types::{
        round_money, Activity, Expense, ExpenseDraft, ExpenseSplit, Member, RemovalPolicyVersion,
        RsvpStatus, Settlement, SplitDraft, TripSettings, UserId,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Main trip ledger interface
#[derive(Debug)]
pub struct Ledger {
    /// Record store
    storage: Arc<Storage>,

    /// Participation-driven split maintenance
    recalculator: SplitRecalculator,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open a ledger with configuration
    pub fn open(config: Config) -> Self {
        let storage = Arc::new(Storage::new());
        let recalculator = SplitRecalculator::new(storage.clone());

        Self {
            storage,
            recalculator,
            config,
        }
    }

    /// Direct store access (settlement workflow shares the same records)
    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Ledger configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // Trip and membership registry

    /// Register a trip
    ///
    /// Currency and removal policy fall back to the configured defaults.
    pub fn create_trip(
        &self,
        trip_id: Uuid,
        currency: Option<String>,
        removal_policy: Option<RemovalPolicyVersion>,
    ) -> Result<TripSettings> {
        let settings = TripSettings {
            trip_id,
            default_currency: currency.unwrap_or_else(|| self.config.default_currency.clone()),
            removal_policy: removal_policy.unwrap_or(self.config.removal.default_policy),
        };

        self.storage.create_trip(settings.clone())?;
        Ok(settings)
    }

    /// Mirror a member row from the membership system
    pub fn upsert_member(&self, member: Member) -> Result<()> {
        self.storage
            .mutate(member.trip_id, |state| state.upsert_member(member.clone()))
    }

    /// Remove a member, gated by the removal-eligibility analysis
    pub fn remove_member(&self, trip_id: Uuid, user_id: &UserId) -> Result<()> {
        self.storage.mutate(trip_id, |state| {
            let analysis = guard::analyze_removal(state, user_id)?;
            if !analysis.can_remove {
                let mut message = analysis
                    .reason
                    .unwrap_or_else(|| format!("{} cannot be removed", user_id));
                if !analysis.suggestions.is_empty() {
                    message.push_str(&format!("; {}", analysis.suggestions.join("; ")));
                }
                return Err(Error::Conflict(message));
            }

            state.remove_member(user_id)?;
            tracing::info!(trip_id = %trip_id, user = %user_id, "Member removed");
            Ok(())
        })
    }

    /// Run the removal-eligibility analysis without removing anyone
    pub fn analyze_removal_eligibility(
        &self,
        trip_id: Uuid,
        user_id: &UserId,
    ) -> Result<RemovalAnalysis> {
        self.storage
            .read(trip_id, |state| guard::analyze_removal(state, user_id))
    }

    // Activity registry

    /// Mirror an activity from the activity system
    pub fn upsert_activity(&self, activity: Activity) -> Result<()> {
        if let Some(cost) = match &activity.payment {
            crate::types::PaymentType::Prepaid { cost }
            | crate::types::PaymentType::PrepaidPerPerson { cost } => Some(*cost),
            _ => None,
        } {
            self.validate_amount(cost)?;
        }

        self.storage.mutate(activity.trip_id, |state| {
            if !state.is_member(&activity.created_by) {
                return Err(Error::Validation(format!(
                    "Activity organizer {} is not a trip member",
                    activity.created_by
                )));
            }
            // Editing an activity that already owns expenses is gated the
            // same way as editing the expenses themselves
            if state.activity(activity.activity_id).is_some() {
                guard::check_activity_mutable(state, activity.activity_id)?;
            }
            state.upsert_activity(activity.clone())
        })
    }

    /// Delete an activity and the expenses it owns, if history allows
    pub fn delete_activity(&self, trip_id: Uuid, activity_id: Uuid) -> Result<()> {
        self.storage.mutate(trip_id, |state| {
            guard::check_activity_mutable(state, activity_id)?;

            let owned: Vec<Uuid> = state
                .expenses_for_activity(activity_id)
                .iter()
                .map(|e| e.expense_id)
                .collect();
            for expense_id in owned {
                state.remove_expense_with_splits(expense_id)?;
            }
            state.remove_activity(activity_id)?;

            tracing::info!(trip_id = %trip_id, activity_id = %activity_id, "Activity deleted");
            Ok(())
        })
    }

    // Expense ledger

    /// Record an expense without splits
    pub fn create_expense(&self, trip_id: Uuid, draft: ExpenseDraft) -> Result<Expense> {
        self.create_expense_with_splits(trip_id, draft, Vec::new())
    }

    /// Record an expense together with its splits as one atomic unit
    pub fn create_expense_with_splits(
        &self,
        trip_id: Uuid,
        draft: ExpenseDraft,
        splits: Vec<SplitDraft>,
    ) -> Result<Expense> {
        self.validate_title(&draft.title)?;
        self.validate_amount(draft.amount)?;
        if splits.len() > self.config.validation.max_splits_per_expense {
            return Err(Error::Validation(format!(
                "{} splits exceed the limit of {}",
                splits.len(),
                self.config.validation.max_splits_per_expense
            )));
        }
        for split in &splits {
            self.validate_amount(split.amount)?;
        }

        self.storage.mutate(trip_id, |state| {
            if !state.is_member(&draft.paid_by) {
                return Err(Error::Validation(format!(
                    "Payer {} is not a trip member",
                    draft.paid_by
                )));
            }
            if let Some(activity_id) = draft.activity_id {
                if state.activity(activity_id).is_none() {
                    return Err(Error::Validation(format!(
                        "Unknown activity reference {}",
                        activity_id
                    )));
                }
            }
            for split in &splits {
                if !state.is_member(&split.user_id) {
                    return Err(Error::Validation(format!(
                        "Split user {} is not a trip member",
                        split.user_id
                    )));
                }
            }

            let expense = Expense {
                expense_id: Uuid::now_v7(),
                trip_id,
                title: draft.title.clone(),
                amount: draft.amount,
                currency: state.settings().default_currency.clone(),
                category: draft.category.clone(),
                paid_by: draft.paid_by.clone(),
                activity_id: draft.activity_id,
                is_settled: false,
                created_at: Utc::now(),
            };
            let expense_id = expense.expense_id;
            state.insert_expense(expense.clone())?;

            for split in &splits {
                state.insert_split(ExpenseSplit {
                    split_id: Uuid::now_v7(),
                    expense_id,
                    user_id: split.user_id.clone(),
                    amount: split.amount,
                    is_paid: split.user_id == draft.paid_by,
                })?;
            }

            state.verify_expense_splits(expense_id)?;

            tracing::info!(
                trip_id = %trip_id,
                expense_id = %expense_id,
                amount = %expense.amount,
                splits = splits.len(),
                "Expense recorded"
            );

            Ok(expense)
        })
    }

    /// Add one split to an existing expense
    pub fn add_split(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        draft: SplitDraft,
    ) -> Result<ExpenseSplit> {
        self.validate_amount(draft.amount)?;

        self.storage.mutate(trip_id, |state| {
            guard::check_expense_mutable(state, expense_id)?;
            if !state.is_member(&draft.user_id) {
                return Err(Error::Validation(format!(
                    "Split user {} is not a trip member",
                    draft.user_id
                )));
            }

            let paid_by = state
                .expense(expense_id)
                .map(|e| e.paid_by.clone())
                .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

            let split = ExpenseSplit {
                split_id: Uuid::now_v7(),
                expense_id,
                user_id: draft.user_id.clone(),
                amount: draft.amount,
                is_paid: draft.user_id == paid_by,
            };
            state.insert_split(split.clone())?;
            Ok(split)
        })
    }

    /// Replace every split of an expense as one atomic unit
    pub fn replace_splits(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        drafts: Vec<SplitDraft>,
    ) -> Result<Vec<ExpenseSplit>> {
        for draft in &drafts {
            self.validate_amount(draft.amount)?;
        }

        self.storage.mutate(trip_id, |state| {
            guard::check_expense_mutable(state, expense_id)?;

            let paid_by = state
                .expense(expense_id)
                .map(|e| e.paid_by.clone())
                .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

            for draft in &drafts {
                if !state.is_member(&draft.user_id) {
                    return Err(Error::Validation(format!(
                        "Split user {} is not a trip member",
                        draft.user_id
                    )));
                }
            }

            let splits: Vec<ExpenseSplit> = drafts
                .iter()
                .map(|draft| ExpenseSplit {
                    split_id: Uuid::now_v7(),
                    expense_id,
                    user_id: draft.user_id.clone(),
                    amount: draft.amount,
                    is_paid: draft.user_id == paid_by,
                })
                .collect();

            state.replace_splits(expense_id, splits.clone())?;
            state.verify_expense_splits(expense_id)?;

            Ok(splits)
        })
    }

    /// Edit an expense's descriptive fields and amount, if history allows
    pub fn update_expense(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        draft: ExpenseDraft,
    ) -> Result<Expense> {
        self.validate_title(&draft.title)?;
        self.validate_amount(draft.amount)?;

        self.storage.mutate(trip_id, |state| {
            guard::check_expense_mutable(state, expense_id)?;
            if !state.is_member(&draft.paid_by) {
                return Err(Error::Validation(format!(
                    "Payer {} is not a trip member",
                    draft.paid_by
                )));
            }

            let mut expense = state
                .expense(expense_id)
                .cloned()
                .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

            expense.title = draft.title.clone();
            expense.amount = draft.amount;
            expense.category = draft.category.clone();
            expense.paid_by = draft.paid_by.clone();

            state.update_expense(expense.clone())?;
            state.verify_expense_splits(expense_id)?;

            Ok(expense)
        })
    }

    /// Edit an expense and replace its splits as one atomic unit
    ///
    /// Changing an amount and its shares separately would trip the split-sum
    /// invariant in between; this does both in one transaction.
    pub fn update_expense_with_splits(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        draft: ExpenseDraft,
        splits: Vec<SplitDraft>,
    ) -> Result<Expense> {
        self.validate_title(&draft.title)?;
        self.validate_amount(draft.amount)?;
        for split in &splits {
            self.validate_amount(split.amount)?;
        }

        self.storage.mutate(trip_id, |state| {
            guard::check_expense_mutable(state, expense_id)?;
            if !state.is_member(&draft.paid_by) {
                return Err(Error::Validation(format!(
                    "Payer {} is not a trip member",
                    draft.paid_by
                )));
            }
            for split in &splits {
                if !state.is_member(&split.user_id) {
                    return Err(Error::Validation(format!(
                        "Split user {} is not a trip member",
                        split.user_id
                    )));
                }
            }

            let mut expense = state
                .expense(expense_id)
                .cloned()
                .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

            expense.title = draft.title.clone();
            expense.amount = draft.amount;
            expense.category = draft.category.clone();
            expense.paid_by = draft.paid_by.clone();
            state.update_expense(expense.clone())?;

            let splits: Vec<ExpenseSplit> = splits
                .iter()
                .map(|split| ExpenseSplit {
                    split_id: Uuid::now_v7(),
                    expense_id,
                    user_id: split.user_id.clone(),
                    amount: split.amount,
                    is_paid: split.user_id == draft.paid_by,
                })
                .collect();
            state.replace_splits(expense_id, splits)?;
            state.verify_expense_splits(expense_id)?;

            Ok(expense)
        })
    }

    /// Delete an expense and its splits, if history allows
    pub fn delete_expense(&self, trip_id: Uuid, expense_id: Uuid) -> Result<()> {
        self.storage.mutate(trip_id, |state| {
            guard::check_expense_mutable(state, expense_id)?;
            state.remove_expense_with_splits(expense_id)?;
            tracing::info!(trip_id = %trip_id, expense_id = %expense_id, "Expense deleted");
            Ok(())
        })
    }

    /// Fetch one expense
    pub fn expense(&self, trip_id: Uuid, expense_id: Uuid) -> Result<Expense> {
        self.storage.read(trip_id, |state| {
            state
                .expense(expense_id)
                .cloned()
                .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))
        })
    }

    /// All expenses of a trip
    pub fn expenses(&self, trip_id: Uuid) -> Result<Vec<Expense>> {
        self.storage
            .read(trip_id, |state| Ok(state.expenses().cloned().collect()))
    }

    /// Splits of one expense
    pub fn splits_for_expense(&self, trip_id: Uuid, expense_id: Uuid) -> Result<Vec<ExpenseSplit>> {
        self.storage.read(trip_id, |state| {
            if state.expense(expense_id).is_none() {
                return Err(Error::ExpenseNotFound(expense_id.to_string()));
            }
            Ok(state
                .splits_for_expense(expense_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    /// All settlements of a trip (history included)
    pub fn settlements(&self, trip_id: Uuid) -> Result<Vec<Settlement>> {
        self.storage
            .read(trip_id, |state| Ok(state.settlements().cloned().collect()))
    }

    // Balances

    /// Compute net balances for every involved user
    ///
    /// Pure derivation from the store; a conservation drift is reported, not
    /// hidden.
    pub fn calculate_balances(&self, trip_id: Uuid) -> Result<Vec<UserBalance>> {
        let balances = self
            .storage
            .read(trip_id, |state| Ok(balance::calculate_balances(state)))?;

        if let Err(error) = balance::verify_conservation(&balances) {
            tracing::warn!(
                trip_id = %trip_id,
                error = %error,
                "Trip balances do not net to zero (orphaned expense history or drift)"
            );
        }

        Ok(balances)
    }

    /// Net balance of one user
    pub fn balance_for(&self, trip_id: Uuid, user_id: &UserId) -> Result<UserBalance> {
        self.storage
            .read(trip_id, |state| Ok(balance::balance_for(state, user_id)))
    }

    // Participation

    /// Handle an activity RSVP change (fire-and-forget into the recalculator)
    pub fn on_activity_rsvp_changed(
        &self,
        trip_id: Uuid,
        activity_id: Uuid,
        user_id: &UserId,
        status: RsvpStatus,
    ) -> Result<()> {
        self.recalculator
            .on_rsvp_changed(trip_id, activity_id, user_id, status)
    }

    // Validation helpers

    fn validate_amount(&self, amount: Decimal) -> Result<()> {
        if amount < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "Amount {} is negative",
                amount
            )));
        }
        if amount > self.config.validation.max_amount {
            return Err(Error::Validation(format!(
                "Amount {} exceeds the limit of {}",
                amount, self.config.validation.max_amount
            )));
        }
        if round_money(amount) != amount {
            return Err(Error::Validation(format!(
                "Amount {} has sub-cent precision",
                amount
            )));
        }
        Ok(())
    }

    fn validate_title(&self, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::Validation("Title is empty".to_string()));
        }
        if title.len() > self.config.validation.max_title_length {
            return Err(Error::Validation(format!(
                "Title length {} exceeds the limit of {}",
                title.len(),
                self.config.validation.max_title_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemberStatus, PaymentType};

    fn member(trip_id: Uuid, user: &str) -> Member {
        Member {
            trip_id,
            user_id: UserId::new(user),
            is_admin: false,
            status: MemberStatus::Active,
            rsvp_status: RsvpStatus::Going,
        }
    }

    fn seeded_ledger(users: &[&str]) -> (Ledger, Uuid) {
        let ledger = Ledger::open(Config::default());
        let trip_id = Uuid::new_v4();
        ledger.create_trip(trip_id, None, None).unwrap();
        for user in users {
            ledger.upsert_member(member(trip_id, user)).unwrap();
        }
        (ledger, trip_id)
    }

    #[test]
    fn test_create_expense_with_splits_roundtrip() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob"]);

        let expense = ledger
            .create_expense_with_splits(
                trip_id,
                ExpenseDraft {
                    title: "Taxi".to_string(),
                    amount: Decimal::new(2400, 2),
                    category: "transport".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: None,
                },
                vec![
                    SplitDraft {
                        user_id: UserId::new("alice"),
                        amount: Decimal::new(1200, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(1200, 2),
                    },
                ],
            )
            .unwrap();

        let splits = ledger.splits_for_expense(trip_id, expense.expense_id).unwrap();
        assert_eq!(splits.len(), 2);
        assert!(splits.iter().find(|s| s.user_id == UserId::new("alice")).unwrap().is_paid);
        assert!(!splits.iter().find(|s| s.user_id == UserId::new("bob")).unwrap().is_paid);
    }

    #[test]
    fn test_mismatched_splits_rejected_atomically() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob"]);

        let result = ledger.create_expense_with_splits(
            trip_id,
            ExpenseDraft {
                title: "Taxi".to_string(),
                amount: Decimal::new(2400, 2),
                category: "transport".to_string(),
                paid_by: UserId::new("alice"),
                activity_id: None,
            },
            vec![SplitDraft {
                user_id: UserId::new("bob"),
                amount: Decimal::new(100, 2), // $1 against a $24 expense
            }],
        );
        assert!(matches!(result, Err(Error::InvariantViolation(_))));

        // nothing committed
        assert!(ledger.expenses(trip_id).unwrap().is_empty());
    }

    #[test]
    fn test_validation_errors_reject_before_write() {
        let (ledger, trip_id) = seeded_ledger(&["alice"]);

        // negative amount
        let result = ledger.create_expense(
            trip_id,
            ExpenseDraft {
                title: "Bad".to_string(),
                amount: Decimal::new(-100, 2),
                category: "misc".to_string(),
                paid_by: UserId::new("alice"),
                activity_id: None,
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));

        // sub-cent precision
        let result = ledger.create_expense(
            trip_id,
            ExpenseDraft {
                title: "Bad".to_string(),
                amount: Decimal::new(12345, 3),
                category: "misc".to_string(),
                paid_by: UserId::new("alice"),
                activity_id: None,
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));

        // unknown payer
        let result = ledger.create_expense(
            trip_id,
            ExpenseDraft {
                title: "Bad".to_string(),
                amount: Decimal::new(100, 2),
                category: "misc".to_string(),
                paid_by: UserId::new("mallory"),
                activity_id: None,
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));

        // unknown activity reference
        let result = ledger.create_expense(
            trip_id,
            ExpenseDraft {
                title: "Bad".to_string(),
                amount: Decimal::new(100, 2),
                category: "misc".to_string(),
                paid_by: UserId::new("alice"),
                activity_id: Some(Uuid::new_v4()),
            },
        );
        assert!(matches!(result, Err(Error::Validation(_))));

        assert!(ledger.expenses(trip_id).unwrap().is_empty());
    }

    #[test]
    fn test_update_expense_with_splits_keeps_invariant() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob"]);

        let expense = ledger
            .create_expense_with_splits(
                trip_id,
                ExpenseDraft {
                    title: "Taxi".to_string(),
                    amount: Decimal::new(2400, 2),
                    category: "transport".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: None,
                },
                vec![
                    SplitDraft {
                        user_id: UserId::new("alice"),
                        amount: Decimal::new(1200, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(1200, 2),
                    },
                ],
            )
            .unwrap();

        // The fare was actually $30: amount and shares move together
        let updated = ledger
            .update_expense_with_splits(
                trip_id,
                expense.expense_id,
                ExpenseDraft {
                    title: "Taxi".to_string(),
                    amount: Decimal::new(3000, 2),
                    category: "transport".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: None,
                },
                vec![
                    SplitDraft {
                        user_id: UserId::new("alice"),
                        amount: Decimal::new(1500, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(1500, 2),
                    },
                ],
            )
            .unwrap();
        assert_eq!(updated.amount, Decimal::new(3000, 2));

        // Amount alone cannot drift away from the recorded shares
        let result = ledger.update_expense(
            trip_id,
            expense.expense_id,
            ExpenseDraft {
                title: "Taxi".to_string(),
                amount: Decimal::new(9900, 2),
                category: "transport".to_string(),
                paid_by: UserId::new("alice"),
                activity_id: None,
            },
        );
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_remove_member_blocked_then_allowed() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob"]);

        ledger
            .create_expense_with_splits(
                trip_id,
                ExpenseDraft {
                    title: "Dinner".to_string(),
                    amount: Decimal::new(4000, 2),
                    category: "food".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: None,
                },
                vec![
                    SplitDraft {
                        user_id: UserId::new("alice"),
                        amount: Decimal::new(2000, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(2000, 2),
                    },
                ],
            )
            .unwrap();

        let result = ledger.remove_member(trip_id, &UserId::new("bob"));
        assert!(matches!(result, Err(Error::Conflict(_))));

        // bob pays alice back out of band: record the counter-expense
        ledger
            .create_expense_with_splits(
                trip_id,
                ExpenseDraft {
                    title: "Repayment".to_string(),
                    amount: Decimal::new(2000, 2),
                    category: "settlement".to_string(),
                    paid_by: UserId::new("bob"),
                    activity_id: None,
                },
                vec![SplitDraft {
                    user_id: UserId::new("alice"),
                    amount: Decimal::new(2000, 2),
                }],
            )
            .unwrap();

        ledger.remove_member(trip_id, &UserId::new("bob")).unwrap();
    }

    #[test]
    fn test_delete_activity_cascades_when_unprotected() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob"]);

        let activity = Activity {
            activity_id: Uuid::new_v4(),
            trip_id,
            title: "Surf class".to_string(),
            created_by: UserId::new("alice"),
            payment: PaymentType::PrepaidPerPerson {
                cost: Decimal::new(2500, 2),
            },
        };
        ledger.upsert_activity(activity.clone()).unwrap();
        ledger
            .on_activity_rsvp_changed(
                trip_id,
                activity.activity_id,
                &UserId::new("bob"),
                RsvpStatus::Going,
            )
            .unwrap();

        assert_eq!(ledger.expenses(trip_id).unwrap().len(), 1);

        ledger
            .delete_activity(trip_id, activity.activity_id)
            .unwrap();
        assert!(ledger.expenses(trip_id).unwrap().is_empty());
    }

    #[test]
    fn test_balances_via_facade() {
        let (ledger, trip_id) = seeded_ledger(&["alice", "bob", "carol"]);

        ledger
            .create_expense_with_splits(
                trip_id,
                ExpenseDraft {
                    title: "Cabin".to_string(),
                    amount: Decimal::new(9000, 2),
                    category: "lodging".to_string(),
                    paid_by: UserId::new("alice"),
                    activity_id: None,
                },
                vec![
                    SplitDraft {
                        user_id: UserId::new("alice"),
                        amount: Decimal::new(3000, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("bob"),
                        amount: Decimal::new(3000, 2),
                    },
                    SplitDraft {
                        user_id: UserId::new("carol"),
                        amount: Decimal::new(3000, 2),
                    },
                ],
            )
            .unwrap();

        let balances = ledger.calculate_balances(trip_id).unwrap();
        assert_eq!(balances[0].net_balance, Decimal::new(6000, 2));
        assert_eq!(
            ledger
                .balance_for(trip_id, &UserId::new("bob"))
                .unwrap()
                .net_balance,
            Decimal::new(-3000, 2)
        );
    }
}
