//! Main settlement engine
//!
//! Orchestrates balance reads, debt simplification, and the settlement
//! workflow against a shared ledger.

use crate::{
    config::Config,
    netting::SettlementOptimizer,
    types::{SettlementPlan, SettlementTransaction},
    workflow::SettlementWorkflow,
    Result,
};
use ledger_core::{Ledger, Settlement, UserId};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Settlement engine
#[derive(Debug)]
pub struct SettlementEngine {
    /// Shared trip ledger
    ledger: Arc<Ledger>,

    /// Debt simplification
    optimizer: SettlementOptimizer,

    /// Settlement lifecycle
    workflow: SettlementWorkflow,
}

impl SettlementEngine {
    /// Create a new settlement engine over an existing ledger
    pub fn new(ledger: Arc<Ledger>, config: Config) -> Self {
        let optimizer = SettlementOptimizer::with_epsilon(config.optimizer.epsilon);
        let workflow = SettlementWorkflow::new(ledger.storage());

        Self {
            ledger,
            optimizer,
            workflow,
        }
    }

    /// Compute the minimal settlement plan for a trip
    pub fn optimize_trip(&self, trip_id: Uuid) -> Result<SettlementPlan> {
        let balances = self.ledger.calculate_balances(trip_id)?;

        tracing::info!(
            trip_id = %trip_id,
            users = balances.len(),
            "Optimizing settlements"
        );

        let plan = self.optimizer.optimize(&balances)?;

        tracing::info!(
            trip_id = %trip_id,
            transactions = plan.stats.transaction_count,
            total = %plan.stats.total_amount,
            valid = plan.is_valid,
            "Settlement plan ready"
        );

        Ok(plan)
    }

    /// A member's own suggested payments out of the optimized plan
    pub fn recommendations_for(
        &self,
        trip_id: Uuid,
        user_id: &UserId,
    ) -> Result<Vec<SettlementTransaction>> {
        let balances = self.ledger.calculate_balances(trip_id)?;
        self.optimizer.recommendations_for(&balances, user_id)
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
        self.workflow.initiate(
            trip_id,
            payer_id,
            payee_id,
            amount,
            payment_method,
            payment_link,
        )
    }

    /// Confirm a pending settlement (payee only)
    pub fn confirm(
        &self,
        trip_id: Uuid,
        settlement_id: Uuid,
        confirmer_id: &UserId,
    ) -> Result<Settlement> {
        self.workflow.confirm(trip_id, settlement_id, confirmer_id)
    }

    /// Reject a pending settlement (payee only)
    pub fn reject(
        &self,
        trip_id: Uuid,
        settlement_id: Uuid,
        rejecter_id: &UserId,
    ) -> Result<Settlement> {
        self.workflow.reject(trip_id, settlement_id, rejecter_id)
    }

    /// Access the underlying workflow
    pub fn workflow(&self) -> &SettlementWorkflow {
        &self.workflow
    }
}
