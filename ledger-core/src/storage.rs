//! Ledger store
//!
//! In-memory record store keyed by trip. Every mutating sequence runs inside
//! [`Storage::mutate`], which applies the closure to a scratch copy of the
//! trip state under the write lock and installs it only on success. An error
//! rolls the whole transaction back; readers never observe a partial write.
//!
//! # Record families
//!
//! - `expenses` / `splits` - the expense ledger
//! - `settlements` - settlement history (terminal records never deleted)
//! - `members` / `activities` / `rsvps` - mirrored from external systems
//! - `settings` - per-trip flags (currency label, removal policy version)

use crate::{
    error::{Error, Result},
    types::{
        Activity, ActivityRsvp, Expense, ExpenseSplit, Member, RsvpStatus, Settlement,
        TripSettings, UserId,
    },
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Storage for all trip ledgers
///
/// Trips are independent; mutations on different trips run concurrently,
/// mutations on the same trip serialize on its write lock.
#[derive(Debug, Default)]
pub struct Storage {
    trips: DashMap<Uuid, Arc<RwLock<TripState>>>,
}

impl Storage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trip
    pub fn create_trip(&self, settings: TripSettings) -> Result<()> {
        let trip_id = settings.trip_id;

        if self.trips.contains_key(&trip_id) {
            return Err(Error::Validation(format!(
                "Trip {} already exists",
                trip_id
            )));
        }

        self.trips
            .insert(trip_id, Arc::new(RwLock::new(TripState::new(settings))));

        tracing::info!(trip_id = %trip_id, "Trip ledger created");

        Ok(())
    }

    /// Check if a trip is registered
    pub fn has_trip(&self, trip_id: Uuid) -> bool {
        self.trips.contains_key(&trip_id)
    }

    fn slot(&self, trip_id: Uuid) -> Result<Arc<RwLock<TripState>>> {
        self.trips
            .get(&trip_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::TripNotFound(trip_id.to_string()))
    }

    /// Run a read-only closure against the trip state
    ///
    /// Holds the read lock for the duration of the closure, so the closure
    /// sees one consistent snapshot.
    pub fn read<R>(&self, trip_id: Uuid, f: impl FnOnce(&TripState) -> Result<R>) -> Result<R> {
        let slot = self.slot(trip_id)?;
        let guard = slot.read();
        f(&guard)
    }

    /// Run a mutating closure as one atomic transaction
    ///
    /// The closure operates on a scratch copy; the copy replaces the live
    /// state only when the closure returns `Ok`. Analogous to a write batch:
    /// either every record change commits or none do.
    pub fn mutate<R>(
        &self,
        trip_id: Uuid,
        f: impl FnOnce(&mut TripState) -> Result<R>,
    ) -> Result<R> {
        let slot = self.slot(trip_id)?;
        let mut guard = slot.write();

        let mut scratch = guard.clone();
        let out = f(&mut scratch)?;
        *guard = scratch;

        Ok(out)
    }
}

/// All ledger records for one trip
#[derive(Debug, Clone)]
pub struct TripState {
    settings: TripSettings,
    members: BTreeMap<UserId, Member>,
    expenses: BTreeMap<Uuid, Expense>,
    splits: BTreeMap<Uuid, ExpenseSplit>,
    settlements: BTreeMap<Uuid, Settlement>,
    activities: BTreeMap<Uuid, Activity>,
    rsvps: BTreeMap<(Uuid, UserId), ActivityRsvp>,
}

impl TripState {
    fn new(settings: TripSettings) -> Self {
        Self {
            settings,
            members: BTreeMap::new(),
            expenses: BTreeMap::new(),
            splits: BTreeMap::new(),
            settlements: BTreeMap::new(),
            activities: BTreeMap::new(),
            rsvps: BTreeMap::new(),
        }
    }

    /// Trip settings
    pub fn settings(&self) -> &TripSettings {
        &self.settings
    }

    // Member operations

    /// Insert or update a member
    pub fn upsert_member(&mut self, member: Member) -> Result<()> {
        if member.trip_id != self.settings.trip_id {
            return Err(Error::Validation(format!(
                "Member {} belongs to trip {}, not {}",
                member.user_id, member.trip_id, self.settings.trip_id
            )));
        }

        self.members.insert(member.user_id.clone(), member);
        Ok(())
    }

    /// Remove a member row (history in expenses/splits is retained)
    pub fn remove_member(&mut self, user_id: &UserId) -> Result<Member> {
        let member = self
            .members
            .remove(user_id)
            .ok_or_else(|| Error::MemberNotFound(user_id.to_string()))?;

        // The member's activity answers go with them
        self.rsvps.retain(|(_, uid), _| uid != user_id);

        Ok(member)
    }

    /// Look up a member
    pub fn member(&self, user_id: &UserId) -> Option<&Member> {
        self.members.get(user_id)
    }

    /// Check current membership
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    /// Iterate members in user-id order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    // Expense operations

    /// Insert a new expense
    pub fn insert_expense(&mut self, expense: Expense) -> Result<()> {
        if expense.trip_id != self.settings.trip_id {
            return Err(Error::Validation(format!(
                "Expense {} belongs to trip {}, not {}",
                expense.expense_id, expense.trip_id, self.settings.trip_id
            )));
        }
        if self.expenses.contains_key(&expense.expense_id) {
            return Err(Error::Validation(format!(
                "Expense {} already exists",
                expense.expense_id
            )));
        }

        tracing::debug!(
            expense_id = %expense.expense_id,
            amount = %expense.amount,
            paid_by = %expense.paid_by,
            "Expense inserted"
        );

        self.expenses.insert(expense.expense_id, expense);
        Ok(())
    }

    /// Overwrite an existing expense
    pub fn update_expense(&mut self, expense: Expense) -> Result<()> {
        if !self.expenses.contains_key(&expense.expense_id) {
            return Err(Error::ExpenseNotFound(expense.expense_id.to_string()));
        }

        self.expenses.insert(expense.expense_id, expense);
        Ok(())
    }

    /// Flag an expense as covered by a confirmed settlement
    pub fn mark_expense_settled(&mut self, expense_id: Uuid) -> Result<()> {
        let expense = self
            .expenses
            .get_mut(&expense_id)
            .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

        expense.is_settled = true;
        Ok(())
    }

    /// Delete an expense together with all of its splits
    pub fn remove_expense_with_splits(&mut self, expense_id: Uuid) -> Result<Expense> {
        let expense = self
            .expenses
            .remove(&expense_id)
            .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

        self.splits.retain(|_, split| split.expense_id != expense_id);

        tracing::debug!(expense_id = %expense_id, "Expense removed with splits");

        Ok(expense)
    }

    /// Look up an expense
    pub fn expense(&self, expense_id: Uuid) -> Option<&Expense> {
        self.expenses.get(&expense_id)
    }

    /// Iterate expenses
    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.values()
    }

    /// Expenses generated from one activity
    pub fn expenses_for_activity(&self, activity_id: Uuid) -> Vec<&Expense> {
        self.expenses
            .values()
            .filter(|e| e.activity_id == Some(activity_id))
            .collect()
    }

    // Split operations

    /// Insert a split for an existing expense
    pub fn insert_split(&mut self, split: ExpenseSplit) -> Result<()> {
        if !self.expenses.contains_key(&split.expense_id) {
            return Err(Error::ExpenseNotFound(split.expense_id.to_string()));
        }
        if self.splits.contains_key(&split.split_id) {
            return Err(Error::Validation(format!(
                "Split {} already exists",
                split.split_id
            )));
        }

        self.splits.insert(split.split_id, split);
        Ok(())
    }

    /// Replace all splits of one expense in a single step
    pub fn replace_splits(&mut self, expense_id: Uuid, splits: Vec<ExpenseSplit>) -> Result<()> {
        if !self.expenses.contains_key(&expense_id) {
            return Err(Error::ExpenseNotFound(expense_id.to_string()));
        }
        for split in &splits {
            if split.expense_id != expense_id {
                return Err(Error::Validation(format!(
                    "Split {} references expense {}, not {}",
                    split.split_id, split.expense_id, expense_id
                )));
            }
        }

        self.splits.retain(|_, split| split.expense_id != expense_id);
        let count = splits.len();
        for split in splits {
            self.splits.insert(split.split_id, split);
        }

        tracing::debug!(expense_id = %expense_id, split_count = count, "Splits replaced");

        Ok(())
    }

    /// Remove a single split
    pub fn remove_split(&mut self, split_id: Uuid) -> Result<ExpenseSplit> {
        self.splits
            .remove(&split_id)
            .ok_or_else(|| Error::SplitNotFound(split_id.to_string()))
    }

    /// Splits of one expense, in user-id order
    pub fn splits_for_expense(&self, expense_id: Uuid) -> Vec<&ExpenseSplit> {
        let mut splits: Vec<&ExpenseSplit> = self
            .splits
            .values()
            .filter(|s| s.expense_id == expense_id)
            .collect();
        splits.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        splits
    }

    /// Iterate all splits
    pub fn splits(&self) -> impl Iterator<Item = &ExpenseSplit> {
        self.splits.values()
    }

    /// Sum of split amounts for one expense
    pub fn split_sum(&self, expense_id: Uuid) -> Decimal {
        self.splits
            .values()
            .filter(|s| s.expense_id == expense_id)
            .map(|s| s.amount)
            .sum()
    }

    /// Verify the split-sum invariant for one expense
    ///
    /// The sum of split amounts must equal the expense amount within one
    /// minor currency unit per split. An expense with zero splits is valid
    /// (audit history for an abandoned activity).
    pub fn verify_expense_splits(&self, expense_id: Uuid) -> Result<()> {
        let expense = self
            .expenses
            .get(&expense_id)
            .ok_or_else(|| Error::ExpenseNotFound(expense_id.to_string()))?;

        let splits = self.splits_for_expense(expense_id);
        if splits.is_empty() {
            return Ok(());
        }

        let sum: Decimal = splits.iter().map(|s| s.amount).sum();
        let tolerance = crate::types::cent_epsilon() * Decimal::from(splits.len() as i64);
        let drift = (sum - expense.amount).abs();

        if drift > tolerance {
            return Err(Error::InvariantViolation(format!(
                "Splits of expense {} sum to {} but the expense amount is {} (drift {}, tolerance {})",
                expense_id, sum, expense.amount, drift, tolerance
            )));
        }

        Ok(())
    }

    // Settlement operations

    /// Insert a new settlement
    pub fn insert_settlement(&mut self, settlement: Settlement) -> Result<()> {
        if settlement.trip_id != self.settings.trip_id {
            return Err(Error::Validation(format!(
                "Settlement {} belongs to trip {}, not {}",
                settlement.settlement_id, settlement.trip_id, self.settings.trip_id
            )));
        }
        if self.settlements.contains_key(&settlement.settlement_id) {
            return Err(Error::Validation(format!(
                "Settlement {} already exists",
                settlement.settlement_id
            )));
        }

        tracing::debug!(
            settlement_id = %settlement.settlement_id,
            payer = %settlement.payer_id,
            payee = %settlement.payee_id,
            amount = %settlement.amount,
            "Settlement inserted"
        );

        self.settlements
            .insert(settlement.settlement_id, settlement);
        Ok(())
    }

    /// Overwrite an existing settlement
    pub fn update_settlement(&mut self, settlement: Settlement) -> Result<()> {
        if !self.settlements.contains_key(&settlement.settlement_id) {
            return Err(Error::SettlementNotFound(
                settlement.settlement_id.to_string(),
            ));
        }

        self.settlements
            .insert(settlement.settlement_id, settlement);
        Ok(())
    }

    /// Look up a settlement
    pub fn settlement(&self, settlement_id: Uuid) -> Option<&Settlement> {
        self.settlements.get(&settlement_id)
    }

    /// Iterate settlements
    pub fn settlements(&self) -> impl Iterator<Item = &Settlement> {
        self.settlements.values()
    }

    /// First terminal (confirmed or rejected) settlement created after the
    /// given instant, if any
    ///
    /// Expenses older than such a settlement may have fed its amount and are
    /// protected from mutation.
    pub fn terminal_settlement_after(&self, instant: DateTime<Utc>) -> Option<&Settlement> {
        self.settlements
            .values()
            .filter(|s| s.is_terminal() && s.created_at > instant)
            .min_by_key(|s| s.created_at)
    }

    // Activity operations

    /// Insert or update an activity
    pub fn upsert_activity(&mut self, activity: Activity) -> Result<()> {
        if activity.trip_id != self.settings.trip_id {
            return Err(Error::Validation(format!(
                "Activity {} belongs to trip {}, not {}",
                activity.activity_id, activity.trip_id, self.settings.trip_id
            )));
        }

        self.activities.insert(activity.activity_id, activity);
        Ok(())
    }

    /// Remove an activity row (its expenses must be handled by the caller)
    pub fn remove_activity(&mut self, activity_id: Uuid) -> Result<Activity> {
        let activity = self
            .activities
            .remove(&activity_id)
            .ok_or_else(|| Error::ActivityNotFound(activity_id.to_string()))?;

        self.rsvps.retain(|(aid, _), _| *aid != activity_id);

        Ok(activity)
    }

    /// Look up an activity
    pub fn activity(&self, activity_id: Uuid) -> Option<&Activity> {
        self.activities.get(&activity_id)
    }

    /// Iterate activities
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.values()
    }

    // RSVP operations

    /// Record a member's answer on an activity
    pub fn set_rsvp(&mut self, rsvp: ActivityRsvp) -> Result<()> {
        if !self.activities.contains_key(&rsvp.activity_id) {
            return Err(Error::ActivityNotFound(rsvp.activity_id.to_string()));
        }
        if !self.is_member(&rsvp.user_id) {
            return Err(Error::MemberNotFound(rsvp.user_id.to_string()));
        }

        self.rsvps
            .insert((rsvp.activity_id, rsvp.user_id.clone()), rsvp);
        Ok(())
    }

    /// Look up one member's answer on an activity
    pub fn rsvp(&self, activity_id: Uuid, user_id: &UserId) -> Option<&ActivityRsvp> {
        self.rsvps.get(&(activity_id, user_id.clone()))
    }

    /// Current members going to an activity, in user-id order
    pub fn going_users(&self, activity_id: Uuid) -> Vec<UserId> {
        self.rsvps
            .range((activity_id, UserId::new(""))..)
            .take_while(|((aid, _), _)| *aid == activity_id)
            .filter(|(_, rsvp)| rsvp.status == RsvpStatus::Going)
            .filter(|((_, uid), _)| self.is_member(uid))
            .map(|((_, uid), _)| uid.clone())
            .collect()
    }
}
