//! Settlement Engine
//!
//! Debt simplification and settlement lifecycle for trip cost sharing.
//!
//! # Architecture
//!
//! 1. **Balances**: read net positions from the trip ledger
//! 2. **Netting**: greedy debt simplification into a minimal payment plan
//! 3. **Workflow**: payers declare payments, payees confirm or reject
//! 4. **Feedback**: confirmed settlements adjust balances on the next read
//!
//! # Example
//!
//! ```
//! use ledger_core::{Config as LedgerConfig, Ledger};
//! use settlement::{Config, SettlementEngine};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! fn main() -> settlement::Result<()> {
//!     let ledger = Arc::new(Ledger::open(LedgerConfig::default()));
//!     let trip_id = Uuid::new_v4();
//!     ledger.create_trip(trip_id, None, None)?;
//!
//!     let engine = SettlementEngine::new(ledger, Config::default());
//!     let plan = engine.optimize_trip(trip_id)?;
//!     assert!(plan.is_valid);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod netting;
pub mod types;
pub mod workflow;

// Re-exports
pub use config::Config;
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use netting::SettlementOptimizer;
pub use types::{PlanStats, SettlementPlan, SettlementTransaction};
pub use workflow::SettlementWorkflow;
