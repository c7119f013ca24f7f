//! `kardex-ledger` — running-balance ledger and stock reconciliation engine.
//!
//! Pure engine crate: receives already-materialized sheet tables, returns
//! derived views. No network, filesystem, or UI dependencies.

pub mod columns;
pub mod daily;
pub mod error;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod query;
pub mod reconcile;
pub mod render;
pub mod table;

pub use columns::{MovementColumns, SnapshotColumns};
pub use daily::{compute_daily_summary, summarize_day};
pub use error::LedgerError;
pub use ledger::compute_ledger;
pub use model::{
    ClientDayTotal, DailySummary, LedgerEntry, MovementLog, MovementRecord, MovementType,
    ReconciliationReport, ReconciliationRow, ReconciliationStatus, StockSnapshot,
};
pub use reconcile::reconcile;
pub use table::Table;
