use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::columns::{MovementColumns, SnapshotColumns};
use crate::error::LedgerError;
use crate::normalize::{normalize_key, parse_date, parse_quantity};
use crate::table::Table;

pub const MOVEMENTS_TABLE: &str = "movements";
pub const SNAPSHOT_TABLE: &str = "snapshot";

// ---------------------------------------------------------------------------
// Movement log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementType {
    Inflow,
    Outflow,
    /// Any other literal; contributes zero to every balance.
    Other(String),
}

impl MovementType {
    /// Classify a raw movement-type cell. Accepts the English and the
    /// Spanish ("ENTRADA"/"SALIDA") literals in any casing.
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize_key(raw);
        match normalized.as_str() {
            "INFLOW" | "ENTRADA" => Self::Inflow,
            "OUTFLOW" | "SALIDA" => Self::Outflow,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inflow => "INFLOW",
            Self::Outflow => "OUTFLOW",
            Self::Other(literal) => literal,
        }
    }

    /// `+quantity` for inflows, `-quantity` for outflows, `0` otherwise.
    /// Saturates instead of overflowing.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            Self::Inflow => quantity,
            Self::Outflow => quantity.saturating_neg(),
            Self::Other(_) => 0,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MovementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One normalized row of the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementRecord {
    pub date: Option<NaiveDate>,
    pub movement_type: MovementType,
    pub client: String,
    pub model: String,
    pub lot: String,
    pub quantity: i64,
}

impl MovementRecord {
    pub fn signed_quantity(&self) -> i64 {
        self.movement_type.signed(self.quantity)
    }
}

/// The movement log after normalization, remembering which optional columns
/// the source sheet actually had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementLog {
    pub records: Vec<MovementRecord>,
    pub has_date: bool,
    pub has_model: bool,
    pub has_lot: bool,
}

impl MovementLog {
    /// Log built from already-normalized records with every column present.
    pub fn from_records(records: Vec<MovementRecord>) -> Self {
        Self { records, has_date: true, has_model: true, has_lot: true }
    }

    /// Normalize a raw movement sheet.
    ///
    /// Client, movement type and quantity are required. Date, model and lot
    /// are optional here; operations that need them check `has_*`.
    pub fn from_table(table: &Table, columns: &MovementColumns) -> Result<Self, LedgerError> {
        let client_idx = table.require_column(MOVEMENTS_TABLE, "client", &columns.client)?;
        let type_idx =
            table.require_column(MOVEMENTS_TABLE, "movement_type", &columns.movement_type)?;
        let qty_idx = table.require_column(MOVEMENTS_TABLE, "quantity", &columns.quantity)?;
        let date_idx = table.column(&columns.date);
        let model_idx = table.column(&columns.model);
        let lot_idx = table.column(&columns.lot);

        let optional = |row: usize, idx: Option<usize>| -> String {
            idx.map(|i| normalize_key(table.cell(row, i))).unwrap_or_default()
        };

        let records = (0..table.len())
            .map(|row| MovementRecord {
                date: date_idx.and_then(|i| parse_date(table.cell(row, i))),
                movement_type: MovementType::parse(table.cell(row, type_idx)),
                client: normalize_key(table.cell(row, client_idx)),
                model: optional(row, model_idx),
                lot: optional(row, lot_idx),
                quantity: parse_quantity(table.cell(row, qty_idx)),
            })
            .collect();

        Ok(Self {
            records,
            has_date: date_idx.is_some(),
            has_model: model_idx.is_some(),
            has_lot: lot_idx.is_some(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows whose date could not be parsed.
    pub fn unknown_dates(&self) -> usize {
        self.records.iter().filter(|r| r.date.is_none()).count()
    }

    pub(crate) fn require_model(&self) -> Result<(), LedgerError> {
        if self.has_model {
            Ok(())
        } else {
            Err(missing(MOVEMENTS_TABLE, "model"))
        }
    }

    pub(crate) fn require_lot(&self) -> Result<(), LedgerError> {
        if self.has_lot {
            Ok(())
        } else {
            Err(missing(MOVEMENTS_TABLE, "lot"))
        }
    }
}

fn missing(table: &str, field: &str) -> LedgerError {
    LedgerError::MissingRequiredField { table: table.into(), field: field.into() }
}

// ---------------------------------------------------------------------------
// Stock snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSnapshotRecord {
    pub client: String,
    pub model: String,
    pub lot: String,
    pub reported_quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockSnapshot {
    pub records: Vec<StockSnapshotRecord>,
}

impl StockSnapshot {
    /// Normalize a raw snapshot sheet. All three key fields and the reported
    /// quantity are required.
    pub fn from_table(table: &Table, columns: &SnapshotColumns) -> Result<Self, LedgerError> {
        let client_idx = table.require_column(SNAPSHOT_TABLE, "client", &columns.client)?;
        let model_idx = table.require_column(SNAPSHOT_TABLE, "model", &columns.model)?;
        let lot_idx = table.require_column(SNAPSHOT_TABLE, "lot", &columns.lot)?;
        let qty_idx = table.require_column(
            SNAPSHOT_TABLE,
            "reported_quantity",
            &columns.reported_quantity,
        )?;

        let records = (0..table.len())
            .map(|row| StockSnapshotRecord {
                client: normalize_key(table.cell(row, client_idx)),
                model: normalize_key(table.cell(row, model_idx)),
                lot: normalize_key(table.cell(row, lot_idx)),
                reported_quantity: parse_quantity(table.cell(row, qty_idx)),
            })
            .collect();

        Ok(Self { records })
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One movement with its signed quantity and the partition's running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub date: Option<NaiveDate>,
    pub movement_type: MovementType,
    pub model: String,
    pub lot: String,
    pub quantity: i64,
    pub signed_quantity: i64,
    pub running_balance: i64,
}

// ---------------------------------------------------------------------------
// Daily summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDayTotal {
    pub client: String,
    pub inflow: i64,
    pub outflow: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: Option<NaiveDate>,
    /// The movements that fell on `date`, in log order.
    pub rows: Vec<MovementRecord>,
    /// Per-client totals, ordered by client.
    pub totals: Vec<ClientDayTotal>,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    Matched,
    Divergent,
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "MATCHED"),
            Self::Divergent => write!(f, "DIVERGENT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    pub client: String,
    pub model: String,
    pub lot: String,
    pub implied_balance: i64,
    pub reported_quantity: i64,
    pub difference: i64,
    pub status: ReconciliationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub total_keys: usize,
    pub matched: usize,
    pub divergent: usize,
    /// Snapshot keys with no movements. Counted, never emitted as rows.
    pub snapshot_only: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub summary: ReconciliationSummary,
    pub rows: Vec<ReconciliationRow>,
}

impl ReconciliationReport {
    pub fn divergent(&self) -> impl Iterator<Item = &ReconciliationRow> {
        self.rows
            .iter()
            .filter(|r| r.status == ReconciliationStatus::Divergent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn movement_type_literals() {
        assert_eq!(MovementType::parse("inflow"), MovementType::Inflow);
        assert_eq!(MovementType::parse(" Entrada "), MovementType::Inflow);
        assert_eq!(MovementType::parse("SALIDA"), MovementType::Outflow);
        assert_eq!(MovementType::parse("outflow"), MovementType::Outflow);
        assert_eq!(MovementType::parse("ajuste"), MovementType::Other("AJUSTE".into()));
    }

    #[test]
    fn signed_quantity_by_type() {
        assert_eq!(MovementType::Inflow.signed(50), 50);
        assert_eq!(MovementType::Outflow.signed(20), -20);
        assert_eq!(MovementType::Other("AJUSTE".into()).signed(7), 0);
        assert_eq!(MovementType::Outflow.signed(i64::MIN), i64::MAX);
    }

    #[test]
    fn extreme_quantity_cells() {
        let table = Table::from_records(
            headers(&["Fecha", "Tipo de Movimiento", "Cliente", "Modelo", "Lote", "Piezas"]),
            vec![
                vec!["2025-01-05", "ENTRADA", "ACME", "X1", "L1", "9223372036854775807"],
                vec!["2025-01-06", "SALIDA", "ACME", "X1", "L1", "-9223372036854775808"],
                vec!["2025-01-07", "SALIDA", "ACME", "X1", "L1", "-3"],
            ],
        );
        let log = MovementLog::from_table(&table, &MovementColumns::default()).unwrap();
        let quantities: Vec<i64> = log.records.iter().map(|r| r.quantity).collect();
        assert_eq!(quantities, vec![i64::MAX, 0, 0]);
    }

    #[test]
    fn log_from_sheet_normalizes_fields() {
        let table = Table::from_records(
            headers(&["Fecha", "Tipo de Movimiento", "Cliente", "Modelo", "Lote", "Piezas"]),
            vec![vec!["05/01/2025", " entrada", " daewon ", "x1", "lota", "50"]],
        );
        let log = MovementLog::from_table(&table, &MovementColumns::default()).unwrap();
        let r = &log.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2025, 1, 5));
        assert_eq!(r.movement_type, MovementType::Inflow);
        assert_eq!(r.client, "DAEWON");
        assert_eq!(r.model, "X1");
        assert_eq!(r.lot, "LOTA");
        assert_eq!(r.quantity, 50);
        assert!(log.has_date && log.has_model && log.has_lot);
    }

    #[test]
    fn log_without_optional_columns() {
        let table = Table::from_records(
            headers(&["type", "client", "quantity"]),
            vec![vec!["INFLOW", "acme", "abc"]],
        );
        let log = MovementLog::from_table(&table, &MovementColumns::default()).unwrap();
        assert!(!log.has_date && !log.has_model && !log.has_lot);
        assert_eq!(log.records[0].quantity, 0);
        assert_eq!(log.records[0].date, None);
        assert_eq!(log.unknown_dates(), 1);
    }

    #[test]
    fn log_requires_client_type_quantity() {
        let table = Table::new(headers(&["Fecha", "Cliente", "Piezas"]));
        let err = MovementLog::from_table(&table, &MovementColumns::default()).unwrap_err();
        assert_eq!(err, missing(MOVEMENTS_TABLE, "movement_type"));
    }

    #[test]
    fn snapshot_requires_reported_quantity() {
        let table = Table::new(headers(&["Cliente", "Modelo", "Lote"]));
        let err = StockSnapshot::from_table(&table, &SnapshotColumns::default()).unwrap_err();
        assert_eq!(err, missing(SNAPSHOT_TABLE, "reported_quantity"));
    }

    #[test]
    fn serialized_shape() {
        let entry = LedgerEntry {
            date: NaiveDate::from_ymd_opt(2025, 1, 5),
            movement_type: MovementType::Inflow,
            model: "X1".into(),
            lot: "LOTA".into(),
            quantity: 50,
            signed_quantity: 50,
            running_balance: 50,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2025-01-05");
        assert_eq!(json["movement_type"], "INFLOW");
        assert_eq!(json["running_balance"], 50);

        let status = serde_json::to_value(ReconciliationStatus::Divergent).unwrap();
        assert_eq!(status, "DIVERGENT");
    }
}
