use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{ClientDayTotal, DailySummary, MovementLog, MovementType};
use crate::normalize::parse_date;

/// Same-day inflow/outflow/net per client.
///
/// An unparseable target date yields an empty summary rather than an error.
pub fn compute_daily_summary(log: &MovementLog, date: &str) -> DailySummary {
    match parse_date(date) {
        Some(day) => summarize_day(log, day),
        None => DailySummary::default(),
    }
}

/// [`compute_daily_summary`] for an already-parsed day.
pub fn summarize_day(log: &MovementLog, day: NaiveDate) -> DailySummary {
    let rows: Vec<_> = log
        .records
        .iter()
        .filter(|r| r.date == Some(day))
        .cloned()
        .collect();

    let mut groups: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for r in &rows {
        let entry = groups.entry(r.client.as_str()).or_insert((0, 0));
        match r.movement_type {
            MovementType::Inflow => entry.0 = entry.0.saturating_add(r.quantity),
            MovementType::Outflow => entry.1 = entry.1.saturating_add(r.quantity),
            MovementType::Other(_) => {}
        }
    }

    let totals = groups
        .into_iter()
        .map(|(client, (inflow, outflow))| ClientDayTotal {
            client: client.to_string(),
            inflow,
            outflow,
            net: inflow.saturating_sub(outflow),
        })
        .collect();

    DailySummary { date: Some(day), rows, totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MovementRecord;

    fn mv(date: &str, kind: MovementType, client: &str, qty: i64) -> MovementRecord {
        MovementRecord {
            date: parse_date(date),
            movement_type: kind,
            client: client.into(),
            model: "X1".into(),
            lot: "LOTA".into(),
            quantity: qty,
        }
    }

    fn log() -> MovementLog {
        MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Inflow, "DAEWON", 50),
            mv("2025-01-05 17:30", MovementType::Outflow, "SJM", 8),
            mv("2025-01-05", MovementType::Inflow, "SJM", 20),
            mv("2025-01-06", MovementType::Outflow, "DAEWON", 20),
            mv("2025-01-05", MovementType::Other("AJUSTE".into()), "ACME", 4),
            mv("???", MovementType::Inflow, "DAEWON", 1),
        ])
    }

    #[test]
    fn totals_per_client() {
        let summary = compute_daily_summary(&log(), "2025-01-05");
        assert_eq!(summary.rows.len(), 4);
        assert_eq!(
            summary.totals,
            vec![
                ClientDayTotal { client: "ACME".into(), inflow: 0, outflow: 0, net: 0 },
                ClientDayTotal { client: "DAEWON".into(), inflow: 50, outflow: 0, net: 50 },
                ClientDayTotal { client: "SJM".into(), inflow: 20, outflow: 8, net: 12 },
            ]
        );
    }

    #[test]
    fn clients_without_rows_are_absent() {
        let summary = compute_daily_summary(&log(), "06/01/2025");
        assert_eq!(summary.totals.len(), 1);
        assert_eq!(summary.totals[0].client, "DAEWON");
        assert_eq!(summary.totals[0].net, -20);
    }

    #[test]
    fn extreme_totals_saturate() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Inflow, "ACME", i64::MAX),
            mv("2025-01-05", MovementType::Inflow, "ACME", 1),
            mv("2025-01-05", MovementType::Outflow, "SJM", i64::MAX),
            mv("2025-01-05", MovementType::Outflow, "SJM", i64::MAX),
        ]);
        let summary = compute_daily_summary(&log, "2025-01-05");
        assert_eq!(
            summary.totals,
            vec![
                ClientDayTotal { client: "ACME".into(), inflow: i64::MAX, outflow: 0, net: i64::MAX },
                ClientDayTotal { client: "SJM".into(), inflow: 0, outflow: i64::MAX, net: -i64::MAX },
            ]
        );
    }

    #[test]
    fn unparseable_target_is_empty() {
        let summary = compute_daily_summary(&log(), "mañana");
        assert!(summary.rows.is_empty());
        assert!(summary.totals.is_empty());
        assert_eq!(summary.date, None);
    }

    #[test]
    fn day_without_movements() {
        let summary = compute_daily_summary(&log(), "2030-01-01");
        assert!(summary.rows.is_empty());
        assert!(summary.totals.is_empty());
    }
}
