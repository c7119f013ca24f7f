use chrono::NaiveDate;

use crate::model::{ClientDayTotal, LedgerEntry, MovementRecord, ReconciliationRow};
use crate::table::Table;

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

pub fn ledger_table(entries: &[LedgerEntry]) -> Table {
    Table::from_records(
        headers(&[
            "date",
            "movement_type",
            "model",
            "lot",
            "quantity",
            "signed_quantity",
            "running_balance",
        ]),
        entries.iter().map(|e| {
            vec![
                date_cell(e.date),
                e.movement_type.to_string(),
                e.model.clone(),
                e.lot.clone(),
                e.quantity.to_string(),
                e.signed_quantity.to_string(),
                e.running_balance.to_string(),
            ]
        }),
    )
}

pub fn movements_table(rows: &[MovementRecord]) -> Table {
    Table::from_records(
        headers(&["date", "movement_type", "client", "model", "lot", "quantity"]),
        rows.iter().map(|r| {
            vec![
                date_cell(r.date),
                r.movement_type.to_string(),
                r.client.clone(),
                r.model.clone(),
                r.lot.clone(),
                r.quantity.to_string(),
            ]
        }),
    )
}

pub fn daily_table(totals: &[ClientDayTotal]) -> Table {
    Table::from_records(
        headers(&["client", "inflow", "outflow", "net"]),
        totals.iter().map(|t| {
            vec![
                t.client.clone(),
                t.inflow.to_string(),
                t.outflow.to_string(),
                t.net.to_string(),
            ]
        }),
    )
}

pub fn reconciliation_table<'a, I>(rows: I) -> Table
where
    I: IntoIterator<Item = &'a ReconciliationRow>,
{
    Table::from_records(
        headers(&[
            "client",
            "model",
            "lot",
            "implied_balance",
            "reported_quantity",
            "difference",
            "status",
        ]),
        rows.into_iter().map(|r| {
            vec![
                r.client.clone(),
                r.model.clone(),
                r.lot.clone(),
                r.implied_balance.to_string(),
                r.reported_quantity.to_string(),
                r.difference.to_string(),
                r.status.to_string(),
            ]
        }),
    )
}
