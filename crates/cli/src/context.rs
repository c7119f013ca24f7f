//! Settings plus the one sheet-source handle every command reads through.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kardex_config::settings::SourceKind;
use kardex_config::Settings;
use kardex_io::csv::CsvDirSource;
use kardex_io::gsheets::GoogleSheetSource;
use kardex_io::workbook::WorkbookSource;
use kardex_io::SheetSource;
use kardex_ledger::{MovementLog, StockSnapshot, Table};

use crate::CliError;

pub struct Context {
    pub settings: Settings,
    pub config_path: Option<PathBuf>,
    pub source: Box<dyn SheetSource>,
}

impl Context {
    pub fn open(config: Option<&Path>) -> Result<Self, CliError> {
        let (settings, config_path) = Settings::load(config)?;
        let source = build_source(&settings)?;
        log::info!(
            "source: {} ({})",
            source.describe(),
            settings.source.kind.as_str()
        );
        Ok(Self { settings, config_path, source })
    }

    pub fn load_sheet(&self, sheet: &str) -> Result<Table, CliError> {
        let table = self.source.load(sheet)?;
        log::info!("sheet '{sheet}': {} rows, {} columns", table.len(), table.headers.len());
        Ok(table)
    }

    /// The movement log ("Entradas y Salidas"), typed.
    pub fn movement_log(&self) -> Result<MovementLog, CliError> {
        let table = self.load_sheet(&self.settings.sheets.movements)?;
        let log = MovementLog::from_table(&table, &self.settings.columns.movements)?;
        let unknown = log.unknown_dates();
        if unknown > 0 {
            log::debug!("{unknown} movements have no parseable date");
        }
        Ok(log)
    }

    /// The stock snapshot ("Inventario"), typed.
    pub fn snapshot(&self) -> Result<StockSnapshot, CliError> {
        let table = self.load_sheet(&self.settings.sheets.snapshot)?;
        Ok(StockSnapshot::from_table(&table, &self.settings.columns.snapshot)?)
    }
}

/// Build the source once from `[source]`; commands only ever borrow it.
pub fn build_source(settings: &Settings) -> Result<Box<dyn SheetSource>, CliError> {
    let source = &settings.source;
    match source.kind {
        SourceKind::CsvDir => Ok(Box::new(CsvDirSource::new(&source.path))),
        SourceKind::Workbook => Ok(Box::new(WorkbookSource::new(&source.path))),
        SourceKind::GoogleSheets => {
            let sheet_id = source.sheet_id.clone().ok_or_else(|| {
                CliError::new(
                    crate::exit_codes::EXIT_CONFIG,
                    "source.kind = \"google_sheets\" requires source.sheet_id",
                )
            })?;
            let gsheets = GoogleSheetSource::new(
                sheet_id,
                settings.source_token(),
                settings.sheets.views.clone(),
                Duration::from_secs(source.timeout_secs),
            )?;
            Ok(Box::new(gsheets))
        }
    }
}
