//! Participation split recalculator
//!
//! Keeps auto-generated expenses in sync with activity RSVPs. Two payment
//! models drive the ledger:
//!
//! - `Prepaid`: one shared expense per activity, paid by the organizer,
//!   split evenly across whoever is currently going.
//! - `PrepaidPerPerson`: one flat-fee expense per attending non-organizer,
//!   owed to the organizer.
//!
//! The RSVP write and the split recalculation are separate transactions on
//! purpose: a member's attendance answer must survive even when the derived
//! bookkeeping fails. A failed recalculation is logged for reconciliation
//! and never rolls the RSVP back.

use crate::{
    error::Result,
    storage::{Storage, TripState},
    types::{
        round_money, Activity, ActivityRsvp, Expense, ExpenseSplit, PaymentType, RsvpStatus,
        UserId,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Category assigned to auto-generated activity expenses
const ACTIVITY_CATEGORY: &str = "activities";

/// Recalculates expense splits when activity participation changes
#[derive(Debug, Clone)]
pub struct SplitRecalculator {
    storage: Arc<Storage>,
}

impl SplitRecalculator {
    /// Create a recalculator over the given store
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Handle an RSVP change on an activity
    ///
    /// Persists the RSVP first; the split recalculation runs as a second
    /// transaction whose failure is logged and swallowed (the attendance
    /// answer wins over derived bookkeeping).
    pub fn on_rsvp_changed(
        &self,
        trip_id: Uuid,
        activity_id: Uuid,
        user_id: &UserId,
        status: RsvpStatus,
    ) -> Result<()> {
        let activity = self.storage.mutate(trip_id, |state| {
            let activity = state
                .activity(activity_id)
                .cloned()
                .ok_or_else(|| crate::Error::ActivityNotFound(activity_id.to_string()))?;

            state.set_rsvp(ActivityRsvp {
                activity_id,
                user_id: user_id.clone(),
                status,
                updated_at: Utc::now(),
            })?;

            Ok(activity)
        })?;

        tracing::debug!(
            trip_id = %trip_id,
            activity_id = %activity_id,
            user = %user_id,
            status = ?status,
            "RSVP recorded"
        );

        if let Err(error) = self.recalculate(trip_id, &activity, user_id, status) {
            tracing::error!(
                trip_id = %trip_id,
                activity_id = %activity_id,
                user = %user_id,
                error = %error,
                "Split recalculation failed after RSVP change; ledger needs reconciliation"
            );
        }

        Ok(())
    }

    /// Recalculate splits for one activity after an RSVP transition
    pub fn recalculate(
        &self,
        trip_id: Uuid,
        activity: &Activity,
        user_id: &UserId,
        status: RsvpStatus,
    ) -> Result<()> {
        match &activity.payment {
            PaymentType::Prepaid { cost } if *cost > Decimal::ZERO => {
                self.recalculate_shared(trip_id, activity, *cost)
            }
            PaymentType::PrepaidPerPerson { cost } if *cost > Decimal::ZERO => {
                self.recalculate_per_person(trip_id, activity, user_id, status, *cost)
            }
            PaymentType::Prepaid { .. }
            | PaymentType::PrepaidPerPerson { .. }
            | PaymentType::Free
            | PaymentType::Included
            | PaymentType::PaymentOnsite
            | PaymentType::PayInAdvance => Ok(()),
        }
    }

    /// Shared cost: one expense, splits replaced wholesale from the going set
    fn recalculate_shared(&self, trip_id: Uuid, activity: &Activity, cost: Decimal) -> Result<()> {
        let activity_id = activity.activity_id;

        self.storage.mutate(trip_id, |state| {
            let going = state.going_users(activity_id);
            let existing = state
                .expenses_for_activity(activity_id)
                .first()
                .map(|e| e.expense_id);

            let expense_id = match (existing, going.is_empty()) {
                (None, true) => return Ok(()),
                (None, false) => {
                    let expense = activity_expense(state, trip_id, activity, cost);
                    let expense_id = expense.expense_id;
                    state.insert_expense(expense)?;
                    expense_id
                }
                (Some(expense_id), true) => {
                    // Keep the expense for audit history, drop every share
                    state.replace_splits(expense_id, Vec::new())?;
                    tracing::info!(
                        activity_id = %activity_id,
                        expense_id = %expense_id,
                        "No attendees left; shared splits cleared"
                    );
                    return Ok(());
                }
                (Some(expense_id), false) => expense_id,
            };

            let splits = even_splits(expense_id, cost, &going, &activity.created_by);
            state.replace_splits(expense_id, splits)?;
            state.verify_expense_splits(expense_id)?;

            tracing::info!(
                activity_id = %activity_id,
                expense_id = %expense_id,
                attendees = going.len(),
                "Shared splits recalculated"
            );

            Ok(())
        })
    }

    /// Flat fee: one expense+split per attending non-organizer
    fn recalculate_per_person(
        &self,
        trip_id: Uuid,
        activity: &Activity,
        user_id: &UserId,
        status: RsvpStatus,
        cost: Decimal,
    ) -> Result<()> {
        // The organizer never owes themselves an attendance fee
        if *user_id == activity.created_by {
            return Ok(());
        }

        let activity_id = activity.activity_id;

        self.storage.mutate(trip_id, |state| {
            let existing = state
                .expenses_for_activity(activity_id)
                .iter()
                .find(|e| {
                    state
                        .splits_for_expense(e.expense_id)
                        .iter()
                        .any(|s| s.user_id == *user_id)
                })
                .map(|e| e.expense_id);

            match (status, existing) {
                (RsvpStatus::Going, None) => {
                    let expense = activity_expense(state, trip_id, activity, cost);
                    let expense_id = expense.expense_id;
                    state.insert_expense(expense)?;
                    state.insert_split(ExpenseSplit {
                        split_id: Uuid::now_v7(),
                        expense_id,
                        user_id: user_id.clone(),
                        amount: cost,
                        is_paid: false,
                    })?;

                    tracing::info!(
                        activity_id = %activity_id,
                        expense_id = %expense_id,
                        user = %user_id,
                        "Per-person fee expense created"
                    );
                }
                (RsvpStatus::Going, Some(_)) => {
                    // Re-affirming attendance is a no-op
                }
                (RsvpStatus::NotGoing | RsvpStatus::Pending, Some(expense_id)) => {
                    let settled = state
                        .expense(expense_id)
                        .map(|e| e.is_settled)
                        .unwrap_or(false);

                    if settled {
                        // Paid history stays; only the share goes away
                        let split_id = state
                            .splits_for_expense(expense_id)
                            .iter()
                            .find(|s| s.user_id == *user_id)
                            .map(|s| s.split_id);
                        if let Some(split_id) = split_id {
                            state.remove_split(split_id)?;
                        }
                        tracing::info!(
                            activity_id = %activity_id,
                            expense_id = %expense_id,
                            user = %user_id,
                            "Attendee left a settled per-person fee; split dropped, expense kept"
                        );
                    } else {
                        state.remove_expense_with_splits(expense_id)?;
                        tracing::info!(
                            activity_id = %activity_id,
                            expense_id = %expense_id,
                            user = %user_id,
                            "Attendee left; per-person fee expense deleted"
                        );
                    }
                }
                (RsvpStatus::NotGoing | RsvpStatus::Pending, None) => {}
            }

            Ok(())
        })
    }
}

/// Build the auto-generated expense for an activity
fn activity_expense(
    state: &TripState,
    trip_id: Uuid,
    activity: &Activity,
    cost: Decimal,
) -> Expense {
    Expense {
        expense_id: Uuid::now_v7(),
        trip_id,
        title: activity.title.clone(),
        amount: cost,
        currency: state.settings().default_currency.clone(),
        category: ACTIVITY_CATEGORY.to_string(),
        paid_by: activity.created_by.clone(),
        activity_id: Some(activity.activity_id),
        is_settled: false,
        created_at: Utc::now(),
    }
}

/// Divide a shared cost evenly across the going set
///
/// Each share is the cost over the headcount rounded to minor units; the
/// first participant in user-id order absorbs the rounding remainder so the
/// shares always sum to the cost exactly.
fn even_splits(
    expense_id: Uuid,
    cost: Decimal,
    going: &[UserId],
    organizer: &UserId,
) -> Vec<ExpenseSplit> {
    let headcount = Decimal::from(going.len() as i64);
    let base = round_money(cost / headcount);
    let remainder = cost - base * headcount;

    going
        .iter()
        .enumerate()
        .map(|(i, user_id)| ExpenseSplit {
            split_id: Uuid::now_v7(),
            expense_id,
            user_id: user_id.clone(),
            amount: if i == 0 { base + remainder } else { base },
            is_paid: user_id == organizer,
        })
        .collect()
}
