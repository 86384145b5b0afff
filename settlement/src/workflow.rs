//! Settlement lifecycle state machine
//!
//! `pending -> confirmed` or `pending -> rejected`, nothing else. The payer
//! declares the payment; only the payee can resolve it. Terminal records are
//! permanent history: a rejected settlement still proves a settlement round
//! happened, which the integrity guard uses to protect older expenses.

use crate::{Error, Result};
use chrono::Utc;
use ledger_core::types::round_money;
use ledger_core::{Settlement, SettlementStatus, Storage, UserId};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Settlement workflow over the shared ledger store
#[derive(Debug, Clone)]
pub struct SettlementWorkflow {
    storage: Arc<Storage>,
}

impl SettlementWorkflow {
    /// Create a workflow over the given store
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Record a payer's declared intent to pay
    pub fn initiate(
        &self,
        trip_id: Uuid,
        payer_id: &UserId,
        payee_id: &UserId,
        amount: Decimal,
        payment_method: Option<String>,
        payment_link: Option<String>,
    ) -> Result<Settlement> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(format!(
                "Settlement amount {} must be positive",
                amount
            )));
        }
        if round_money(amount) != amount {
            return Err(Error::Validation(format!(
                "Settlement amount {} has sub-cent precision",
                amount
            )));
        }
        if payer_id == payee_id {
            return Err(Error::Validation(format!(
                "{} cannot settle with themselves",
                payer_id
            )));
        }

        let settlement = self.storage.mutate(trip_id, |state| {
            if !state.is_member(payer_id) {
                return Err(ledger_core::Error::Validation(format!(
                    "Payer {} is not a trip member",
                    payer_id
                )));
            }
            if !state.is_member(payee_id) {
                return Err(ledger_core::Error::Validation(format!(
                    "Payee {} is not a trip member",
                    payee_id
                )));
            }

            let settlement = Settlement {
                settlement_id: Uuid::now_v7(),
                trip_id,
                payer_id: payer_id.clone(),
                payee_id: payee_id.clone(),
                amount,
                currency: state.settings().default_currency.clone(),
                status: SettlementStatus::Pending,
                payment_method: payment_method.clone(),
                payment_link: payment_link.clone(),
                created_at: Utc::now(),
                confirmed_at: None,
                rejected_at: None,
                resolved_by: None,
            };

            state.insert_settlement(settlement.clone())?;
            Ok(settlement)
        })?;

        tracing::info!(
            trip_id = %trip_id,
            settlement_id = %settlement.settlement_id,
            payer = %payer_id,
            payee = %payee_id,
            amount = %amount,
            "Settlement initiated"
        );

        Ok(settlement)
    }

    /// Confirm a pending settlement (payee only)
    ///
    /// Confirmation adjusts computed balances from the next read on, and
    /// stamps every expense created before this settlement as settled.
    pub fn confirm(
        &self,
        trip_id: Uuid,
        settlement_id: Uuid,
        confirmer_id: &UserId,
    ) -> Result<Settlement> {
        let settlement = self.storage.mutate(trip_id, |state| {
            let mut settlement = self.resolvable(state, settlement_id, confirmer_id)?;

            settlement.status = SettlementStatus::Confirmed;
            settlement.confirmed_at = Some(Utc::now());
            settlement.resolved_by = Some(confirmer_id.clone());
            state.update_settlement(settlement.clone())?;

            // Everything on the books before this settlement fed the numbers
            // the payer acted on
            let prior: Vec<Uuid> = state
                .expenses()
                .filter(|e| e.created_at < settlement.created_at && !e.is_settled)
                .map(|e| e.expense_id)
                .collect();
            for expense_id in prior {
                state.mark_expense_settled(expense_id)?;
            }

            Ok(settlement)
        })?;

        tracing::info!(
            trip_id = %trip_id,
            settlement_id = %settlement_id,
            confirmer = %confirmer_id,
            "Settlement confirmed"
        );

        Ok(settlement)
    }

    /// Reject a pending settlement (payee only)
    ///
    /// Has no balance effect but stays on record permanently.
    pub fn reject(
        &self,
        trip_id: Uuid,
        settlement_id: Uuid,
        rejecter_id: &UserId,
    ) -> Result<Settlement> {
        let settlement = self.storage.mutate(trip_id, |state| {
            let mut settlement = self.resolvable(state, settlement_id, rejecter_id)?;

            settlement.status = SettlementStatus::Rejected;
            settlement.rejected_at = Some(Utc::now());
            settlement.resolved_by = Some(rejecter_id.clone());
            state.update_settlement(settlement.clone())?;

            Ok(settlement)
        })?;

        tracing::info!(
            trip_id = %trip_id,
            settlement_id = %settlement_id,
            rejecter = %rejecter_id,
            "Settlement rejected"
        );

        Ok(settlement)
    }

    /// Fetch one settlement
    pub fn settlement(&self, trip_id: Uuid, settlement_id: Uuid) -> Result<Settlement> {
        Ok(self.storage.read(trip_id, |state| {
            state
                .settlement(settlement_id)
                .cloned()
                .ok_or_else(|| ledger_core::Error::SettlementNotFound(settlement_id.to_string()))
        })?)
    }

    /// Load a settlement and check it may be resolved by this user
    fn resolvable(
        &self,
        state: &ledger_core::TripState,
        settlement_id: Uuid,
        resolver_id: &UserId,
    ) -> ledger_core::Result<Settlement> {
        let settlement = state
            .settlement(settlement_id)
            .cloned()
            .ok_or_else(|| ledger_core::Error::SettlementNotFound(settlement_id.to_string()))?;

        if settlement.payee_id != *resolver_id {
            return Err(ledger_core::Error::Conflict(format!(
                "Only the payee {} may resolve settlement {}, not {}",
                settlement.payee_id, settlement_id, resolver_id
            )));
        }
        if settlement.is_terminal() {
            return Err(ledger_core::Error::Conflict(format!(
                "Settlement {} is already {:?} and cannot be resolved again",
                settlement_id, settlement.status
            )));
        }

        Ok(settlement)
    }
}
