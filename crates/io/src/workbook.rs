// Workbook sheets (xlsx, xls, xlsb, ods) via calamine

use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use kardex_ledger::Table;

use crate::error::SourceError;
use crate::source::SheetSource;

pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for WorkbookSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn sheet_names(&self) -> Result<Vec<String>, SourceError> {
        let workbook = open_workbook_auto(&self.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(workbook.sheet_names().to_vec())
    }

    fn load(&self, sheet: &str) -> Result<Table, SourceError> {
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;

        if !workbook.sheet_names().iter().any(|s| s == sheet) {
            return Err(SourceError::NotFound {
                source: self.describe(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| SourceError::Parse(format!("sheet '{sheet}': {e}")))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(cell_text).collect(),
            None => return Ok(Table::default()),
        };

        let table = Table::from_records(headers, rows.map(|r| r.iter().map(cell_text)));
        log::debug!("loaded {} rows from {}!{}", table.len(), self.path.display(), sheet);
        Ok(table)
    }
}

/// Render a cell the way the sheet displays it for our purposes: integral
/// numbers without a fraction, dates as `YYYY-MM-DD`, errors as blank.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format_number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Excel 1900 date system serial to calendar date. Time of day is dropped.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Day 0 is 1899-12-30 once the 1900 leap-year bug is accounted for.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
