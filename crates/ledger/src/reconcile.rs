use std::collections::{BTreeMap, HashMap};

use crate::error::LedgerError;
use crate::model::{
    MovementLog, ReconciliationReport, ReconciliationRow, ReconciliationStatus,
    ReconciliationSummary, StockSnapshot,
};

/// Normalized (client, model, lot).
type StockKey = (String, String, String);

/// Cross-check implied balances from the movement log against reported stock.
///
/// The join is driven by the log: every key that moved yields exactly one row,
/// a missing snapshot reports `0`, and snapshot-only keys are only counted in
/// the summary. Status is `MATCHED` only on an exact zero difference.
pub fn reconcile(
    log: &MovementLog,
    snapshot: &StockSnapshot,
) -> Result<ReconciliationReport, LedgerError> {
    log.require_model()?;
    log.require_lot()?;

    let implied = implied_balances(log);
    let mut reported = reported_quantities(snapshot);

    let rows: Vec<ReconciliationRow> = implied
        .into_iter()
        .map(|(key, implied_balance)| {
            let reported_quantity = reported.remove(&key).unwrap_or(0);
            let difference = reported_quantity.saturating_sub(implied_balance);
            let (client, model, lot) = key;
            ReconciliationRow {
                client,
                model,
                lot,
                implied_balance,
                reported_quantity,
                difference,
                status: if difference == 0 {
                    ReconciliationStatus::Matched
                } else {
                    ReconciliationStatus::Divergent
                },
            }
        })
        .collect();

    let summary = compute_summary(&rows, reported.len());
    Ok(ReconciliationReport { summary, rows })
}

/// Global signed-quantity sum per key, ordered by key.
fn implied_balances(log: &MovementLog) -> BTreeMap<StockKey, i64> {
    let mut groups: BTreeMap<StockKey, i64> = BTreeMap::new();
    for r in &log.records {
        let balance = groups
            .entry((r.client.clone(), r.model.clone(), r.lot.clone()))
            .or_insert(0);
        *balance = balance.saturating_add(r.signed_quantity());
    }
    groups
}

/// Reported stock per key. Duplicate snapshot rows for a key are summed.
fn reported_quantities(snapshot: &StockSnapshot) -> HashMap<StockKey, i64> {
    let mut reported: HashMap<StockKey, i64> = HashMap::new();
    for r in &snapshot.records {
        let quantity = reported
            .entry((r.client.clone(), r.model.clone(), r.lot.clone()))
            .or_insert(0);
        *quantity = quantity.saturating_add(r.reported_quantity);
    }
    reported
}

fn compute_summary(rows: &[ReconciliationRow], snapshot_only: usize) -> ReconciliationSummary {
    let matched = rows
        .iter()
        .filter(|r| r.status == ReconciliationStatus::Matched)
        .count();

    ReconciliationSummary {
        total_keys: rows.len(),
        matched,
        divergent: rows.len() - matched,
        snapshot_only,
    }
}
