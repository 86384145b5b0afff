//! End-to-end trip simulation binary
//!
//! Seeds a small trip, runs the full expense/RSVP/settlement cycle, and
//! prints the resulting plan and balances as JSON.

use ledger_core::types::{ExpenseDraft, SplitDraft};
use ledger_core::{
    Activity, Config as LedgerConfig, Ledger, Member, MemberStatus, PaymentType, RsvpStatus,
    UserId,
};
use rust_decimal::Decimal;
use settlement::{Config, SettlementEngine};
use std::sync::Arc;
use uuid::Uuid;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting TripTab settlement simulation");

    let ledger = Arc::new(Ledger::open(LedgerConfig::default()));
    let engine = SettlementEngine::new(ledger.clone(), Config::default());

    let trip_id = Uuid::new_v4();
    ledger.create_trip(trip_id, None, None)?;

    for user in ["alice", "bob", "carol"] {
        ledger.upsert_member(Member {
            trip_id,
            user_id: UserId::new(user),
            is_admin: user == "alice",
            status: MemberStatus::Active,
            rsvp_status: RsvpStatus::Going,
        })?;
    }

    // Manual expense: alice fronts the cabin
    ledger.create_expense_with_splits(
        trip_id,
        ExpenseDraft {
            title: "Cabin".to_string(),
            amount: Decimal::new(24000, 2),
            category: "lodging".to_string(),
            paid_by: UserId::new("alice"),
            activity_id: None,
        },
        vec![
            SplitDraft {
                user_id: UserId::new("alice"),
                amount: Decimal::new(8000, 2),
            },
            SplitDraft {
                user_id: UserId::new("bob"),
                amount: Decimal::new(8000, 2),
            },
            SplitDraft {
                user_id: UserId::new("carol"),
                amount: Decimal::new(8000, 2),
            },
        ],
    )?;

    // Shared prepaid activity organized by bob
    let boat = Uuid::new_v4();
    ledger.upsert_activity(Activity {
        activity_id: boat,
        trip_id,
        title: "Boat tour".to_string(),
        created_by: UserId::new("bob"),
        payment: PaymentType::Prepaid {
            cost: Decimal::new(10000, 2),
        },
    })?;
    for user in ["alice", "bob", "carol"] {
        ledger.on_activity_rsvp_changed(trip_id, boat, &UserId::new(user), RsvpStatus::Going)?;
    }

    // Per-person museum tickets organized by carol; bob backs out again
    let museum = Uuid::new_v4();
    ledger.upsert_activity(Activity {
        activity_id: museum,
        trip_id,
        title: "Museum tickets".to_string(),
        created_by: UserId::new("carol"),
        payment: PaymentType::PrepaidPerPerson {
            cost: Decimal::new(1500, 2),
        },
    })?;
    for user in ["alice", "bob"] {
        ledger.on_activity_rsvp_changed(trip_id, museum, &UserId::new(user), RsvpStatus::Going)?;
    }
    ledger.on_activity_rsvp_changed(trip_id, museum, &UserId::new("bob"), RsvpStatus::NotGoing)?;

    let balances = ledger.calculate_balances(trip_id)?;
    println!("{}", serde_json::to_string_pretty(&balances)?);

    let plan = engine.optimize_trip(trip_id)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);

    // Execute the plan: each payer declares, each payee confirms
    for transaction in &plan.transactions {
        let settlement = engine.initiate(
            trip_id,
            &transaction.from,
            &transaction.to,
            transaction.amount,
            Some("bank-transfer".to_string()),
            None,
        )?;
        engine.confirm(trip_id, settlement.settlement_id, &transaction.to)?;
    }

    let balances = ledger.calculate_balances(trip_id)?;
    println!("{}", serde_json::to_string_pretty(&balances)?);

    tracing::info!("Simulation complete: trip is square");
    Ok(())
}
