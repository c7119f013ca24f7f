use serde::Serialize;

use crate::error::LedgerError;
use crate::normalize::normalize_key;

/// A materialized sheet: one header row plus text-valued data rows.
///
/// Every row has exactly `headers.len()` cells. Fully blank rows are dropped
/// on construction, mirroring how the tracker sheets are exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    #[serde(rename = "columns")]
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a table from a header row and raw records, padding short rows and
    /// truncating long ones to the header width.
    pub fn from_records<I, R, S>(headers: Vec<String>, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(headers);
        for record in records {
            table.push_row(record.into_iter().map(Into::into).collect());
        }
        table
    }

    /// Parse CSV text whose first record is the header row.
    pub fn from_csv_str(data: &str, delimiter: u8) -> Result<Self, LedgerError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| LedgerError::Csv(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut table = Self::new(headers);
        for record in reader.records() {
            let record = record.map_err(|e| LedgerError::Csv(e.to_string()))?;
            table.push_row(record.iter().map(|f| f.to_string()).collect());
        }
        Ok(table)
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return;
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header matching any alias (trimmed, case-insensitive).
    pub fn column(&self, aliases: &[String]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            let alias = normalize_key(alias);
            self.headers.iter().position(|h| normalize_key(h) == alias)
        })
    }

    /// Like [`Table::column`], but a miss is a `MissingRequiredField` for `field`.
    pub fn require_column(
        &self,
        table_name: &str,
        field: &str,
        aliases: &[String],
    ) -> Result<usize, LedgerError> {
        self.column(aliases).ok_or_else(|| LedgerError::MissingRequiredField {
            table: table_name.into(),
            field: field.into(),
        })
    }

    /// Cell text; out-of-range columns read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Keep only rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[String]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// First `n` rows, headers unchanged.
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Fixed-width text rendering without an index column.
    ///
    /// Every column is right-aligned to its widest cell, two spaces apart.
    /// This is the flat representation handed to the question layer.
    pub fn to_text(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r.get(i).map(|c| c.chars().count()).unwrap_or(0))
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let mut push_line = |cells: &[String]| {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>width$}", c, width = *w))
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        };

        push_line(&self.headers);
        for row in &self.rows {
            push_line(row);
        }
        out
    }

    /// Serialize as comma-separated CSV with a header row.
    pub fn to_csv(&self) -> Result<String, LedgerError> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| LedgerError::Csv(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| LedgerError::Csv(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| LedgerError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| LedgerError::Csv(e.to_string()))
    }
}
