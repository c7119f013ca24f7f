use crate::error::LedgerError;
use crate::model::{LedgerEntry, MovementLog, MovementRecord};
use crate::normalize::normalize_key;

/// Running-balance trace (Kardex) for one client, optionally one model.
///
/// Rows are stable-sorted by date with unknown dates last, so ties and
/// undated rows keep log order. The running balance is the prefix sum of
/// signed quantities within that order, saturating at the `i64` bounds. No
/// matching rows is an empty ledger.
pub fn compute_ledger(
    log: &MovementLog,
    client: &str,
    model: Option<&str>,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let client = normalize_key(client);
    let model = match model {
        Some(m) => {
            log.require_model()?;
            Some(normalize_key(m))
        }
        None => None,
    };

    let mut rows: Vec<&MovementRecord> = log
        .records
        .iter()
        .filter(|r| r.client == client)
        .filter(|r| model.as_ref().map_or(true, |m| &r.model == m))
        .collect();

    // `sort_by_key` is stable; `None` sorts after every date via the bool.
    rows.sort_by_key(|r| (r.date.is_none(), r.date));

    let mut balance = 0i64;
    let entries = rows
        .into_iter()
        .map(|r| {
            let signed = r.signed_quantity();
            balance = balance.saturating_add(signed);
            LedgerEntry {
                date: r.date,
                movement_type: r.movement_type.clone(),
                model: r.model.clone(),
                lot: r.lot.clone(),
                quantity: r.quantity,
                signed_quantity: signed,
                running_balance: balance,
            }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MovementType;
    use chrono::NaiveDate;

    fn mv(date: &str, kind: MovementType, client: &str, model: &str, qty: i64) -> MovementRecord {
        MovementRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            movement_type: kind,
            client: client.into(),
            model: model.into(),
            lot: "LOTA".into(),
            quantity: qty,
        }
    }

    fn balances(entries: &[LedgerEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.running_balance).collect()
    }

    #[test]
    fn basic_running_balance() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Inflow, "DAEWON", "X1", 50),
            mv("2025-01-10", MovementType::Outflow, "DAEWON", "X1", 20),
        ]);
        let entries = compute_ledger(&log, "daewon", None).unwrap();
        assert_eq!(balances(&entries), vec![50, 30]);
        assert_eq!(entries[1].signed_quantity, -20);
    }

    #[test]
    fn sorted_by_date_unknown_last() {
        let log = MovementLog::from_records(vec![
            mv("bad", MovementType::Inflow, "ACME", "X1", 5),
            mv("2025-02-01", MovementType::Outflow, "ACME", "X1", 10),
            mv("2025-01-01", MovementType::Inflow, "ACME", "X1", 100),
            mv("", MovementType::Inflow, "ACME", "X1", 1),
        ]);
        let entries = compute_ledger(&log, "ACME", None).unwrap();
        let qty: Vec<i64> = entries.iter().map(|e| e.quantity).collect();
        assert_eq!(qty, vec![100, 10, 5, 1]);
        assert_eq!(balances(&entries), vec![100, 90, 95, 96]);
    }

    #[test]
    fn same_day_keeps_log_order() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Outflow, "ACME", "X1", 3),
            mv("2025-01-05", MovementType::Inflow, "ACME", "X1", 10),
        ]);
        let entries = compute_ledger(&log, "ACME", None).unwrap();
        assert_eq!(balances(&entries), vec![-3, 7]);
    }

    #[test]
    fn partition_isolation() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-01", MovementType::Inflow, "ACME", "X1", 10),
            mv("2025-01-02", MovementType::Inflow, "OTHER", "X1", 1000),
            mv("2025-01-03", MovementType::Inflow, "ACME", "Y2", 7),
            mv("2025-01-04", MovementType::Outflow, "ACME", "X1", 4),
        ]);
        let entries = compute_ledger(&log, "ACME", Some(" x1 ")).unwrap();
        assert_eq!(balances(&entries), vec![10, 6]);

        let all_models = compute_ledger(&log, "ACME", None).unwrap();
        assert_eq!(balances(&all_models), vec![10, 17, 13]);
    }

    #[test]
    fn other_movement_types_contribute_zero() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-01", MovementType::Inflow, "ACME", "X1", 10),
            mv("2025-01-02", MovementType::Other("AJUSTE".into()), "ACME", "X1", 99),
        ]);
        let entries = compute_ledger(&log, "ACME", None).unwrap();
        assert_eq!(balances(&entries), vec![10, 10]);
        assert_eq!(entries[1].signed_quantity, 0);
    }

    #[test]
    fn no_match_is_empty() {
        let log = MovementLog::from_records(vec![mv(
            "2025-01-01",
            MovementType::Inflow,
            "ACME",
            "X1",
            10,
        )]);
        assert!(compute_ledger(&log, "NOBODY", None).unwrap().is_empty());
    }

    #[test]
    fn running_balance_saturates() {
        let log = MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Inflow, "ACME", "X1", i64::MAX),
            mv("2025-01-06", MovementType::Inflow, "ACME", "X1", 1),
            mv("2025-01-07", MovementType::Outflow, "ACME", "X1", 10),
        ]);
        let entries = compute_ledger(&log, "ACME", None).unwrap();
        assert_eq!(balances(&entries), vec![i64::MAX, i64::MAX, i64::MAX - 10]);

        let drained = MovementLog::from_records(vec![
            mv("2025-01-05", MovementType::Outflow, "ACME", "X1", i64::MAX),
            mv("2025-01-06", MovementType::Outflow, "ACME", "X1", i64::MAX),
        ]);
        let entries = compute_ledger(&drained, "ACME", None).unwrap();
        assert_eq!(balances(&entries), vec![-i64::MAX, i64::MIN]);
    }

    #[test]
    fn model_filter_requires_model_column() {
        let mut log = MovementLog::from_records(vec![]);
        log.has_model = false;
        let err = compute_ledger(&log, "ACME", Some("X1")).unwrap_err();
        assert!(matches!(err, LedgerError::MissingRequiredField { ref field, .. } if field == "model"));
        assert!(compute_ledger(&log, "ACME", None).is_ok());
    }
}
