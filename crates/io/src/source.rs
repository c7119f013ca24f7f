use kardex_ledger::Table;

use crate::error::SourceError;

/// A spreadsheet-like store that hands out whole sheets as tables.
///
/// Built once at startup and passed by reference to whatever needs data;
/// implementations hold their own connection state.
pub trait SheetSource {
    /// Human-readable origin, e.g. a directory path or spreadsheet id.
    fn describe(&self) -> String;

    /// Sheets the source can serve, where it can enumerate them.
    fn sheet_names(&self) -> Result<Vec<String>, SourceError>;

    /// Load one sheet. The first row is the header row.
    fn load(&self, sheet: &str) -> Result<Table, SourceError>;
}
