//! TripTab Ledger Core
//!
//! Money-conserving expense ledger for trip cost sharing.
//!
//! # Architecture
//!
//! - **Record store**: expenses, splits, and settlements keyed by trip, with
//!   atomic transactions and rollback
//! - **Balance calculator**: net positions derived from the store alone
//! - **Split recalculator**: activity RSVPs drive auto-generated expenses
//! - **Integrity guard**: settled history and departed members cannot be
//!   edited away
//!
//! # Invariants
//!
//! - Money conservation: balances net to zero across involved users
//! - Split sums: per expense, splits equal the amount within one minor
//!   currency unit per split
//! - Pure balances: no cached balance field is authoritative
//! - Settlement history: terminal settlements are never deleted

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod balance;
pub mod config;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod participation;
pub mod storage;
pub mod types;

// Re-exports
pub use balance::{calculate_balances, BalanceBreakdown, UserBalance};
pub use config::Config;
pub use error::{Error, Result};
pub use guard::RemovalAnalysis;
pub use ledger::Ledger;
pub use participation::SplitRecalculator;
pub use storage::{Storage, TripState};
pub use types::{
    Activity, ActivityRsvp, Expense, ExpenseSplit, Member, MemberStatus, PaymentType,
    RemovalPolicyVersion, RsvpStatus, Settlement, SettlementStatus, TripSettings, UserId,
};
