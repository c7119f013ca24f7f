// Data to stdout, files via --output

use std::path::Path;

use kardex_ledger::Table;
use serde::Serialize;

use crate::CliError;

/// Print `table` (or `value` as JSON) to stdout and optionally write a file.
///
/// The file is CSV when its extension is `.csv`, pretty JSON otherwise.
pub fn emit<T: Serialize + ?Sized>(
    table: &Table,
    value: &T,
    json: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    if let Some(path) = output {
        write_output(path, table, value)?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{}", to_json(value)?);
    } else {
        print!("{}", table.to_text());
    }
    Ok(())
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

fn write_output<T: Serialize + ?Sized>(path: &Path, table: &Table, value: &T) -> Result<(), CliError> {
    let contents = if is_csv_path(path) {
        table.to_csv()?
    } else {
        to_json(value)?
    };
    std::fs::write(path, contents)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}
