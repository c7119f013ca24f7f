// CSV/TSV sheet directory

use std::io::Read;
use std::path::{Path, PathBuf};

use kardex_ledger::Table;

use crate::error::SourceError;
use crate::source::SheetSource;

/// A directory holding one delimited file per sheet: `<dir>/<sheet>.csv`
/// (or `.tsv`, `.txt`).
pub struct CsvDirSource {
    dir: PathBuf,
}

const EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn sheet_path(&self, sheet: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{sheet}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl SheetSource for CsvDirSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn sheet_names(&self) -> Result<Vec<String>, SourceError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.dir.display())))?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map_or(false, |e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn load(&self, sheet: &str) -> Result<Table, SourceError> {
        let path = self.sheet_path(sheet).ok_or_else(|| SourceError::NotFound {
            source: self.describe(),
            sheet: sheet.to_string(),
        })?;
        let table = import(&path)?;
        log::debug!("loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}

/// Read a delimited file with a header row, sniffing the delimiter.
pub fn import(path: &Path) -> Result<Table, SourceError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = if path.extension().and_then(|e| e.to_str()) == Some("tsv") {
        b'\t'
    } else {
        sniff_delimiter(&content)
    };
    Ok(Table::from_csv_str(&content, delimiter)?)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (sheet exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, SourceError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{} is not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_semicolon() {
        let content = "Cliente;Modelo;Piezas\nSJM;A1;10\nDAEWON;X1;5\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_comma_default() {
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
    }

    #[test]
    fn loads_sheet_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Entradas y Salidas.csv"),
            "Fecha;Cliente;Piezas\n2025-01-05;sjm;10\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let source = CsvDirSource::new(dir.path());
        assert_eq!(source.sheet_names().unwrap(), vec!["Entradas y Salidas"]);

        let table = source.load("Entradas y Salidas").unwrap();
        assert_eq!(table.headers, vec!["Fecha", "Cliente", "Piezas"]);
        assert_eq!(table.rows[0][1], "sjm");
    }

    #[test]
    fn missing_sheet_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvDirSource::new(dir.path()).load("Inventario").unwrap_err();
        assert!(matches!(err, SourceError::NotFound { ref sheet, .. } if sheet == "Inventario"));
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Inventario.csv");
        // "Año" in Windows-1252: 0xF1 for ñ
        let mut bytes = b"A".to_vec();
        bytes.push(0xF1);
        bytes.extend_from_slice(b"o,Cliente\n2025,SJM\n");
        std::fs::write(&path, bytes).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers[0], "Año");
    }
}
