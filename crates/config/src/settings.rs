// Project settings
// Loaded from ./kardex.toml or ~/.config/kardex/settings.toml

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use kardex_ledger::{MovementColumns, SnapshotColumns};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io(String),
    /// TOML parse / deserialization error.
    Parse(String),
    /// Semantically invalid settings (missing path, bad limits, ...).
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read config: {msg}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Directory with one CSV per sheet
    #[default]
    CsvDir,
    /// Single workbook file (xlsx, xls, ods)
    Workbook,
    /// Google Sheets CSV export
    GoogleSheets,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CsvDir => "csv_dir",
            Self::Workbook => "workbook",
            Self::GoogleSheets => "google_sheets",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,

    /// Directory (csv_dir) or file (workbook). Relative paths resolve
    /// against the config file's directory.
    pub path: PathBuf,

    /// Spreadsheet id (google_sheets)
    pub sheet_id: Option<String>,

    /// Environment variable holding a bearer token for private sheets
    pub token_env: Option<String>,

    /// HTTP timeout for remote sources
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::CsvDir,
            path: PathBuf::from("."),
            sheet_id: None,
            token_env: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Movement log
    pub movements: String,
    /// Reported stock snapshot
    pub snapshot: String,
    /// Sheet the question layer reads
    pub inventory: String,
    /// Sheets offered by `kardex sheets` / `kardex show`
    pub views: Vec<String>,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            movements: "Entradas y Salidas".into(),
            snapshot: "Inventario".into(),
            inventory: "Inventario".into(),
            views: ["Entradas y Salidas", "Inventario", "MODELO", "POR CLIENTE", "PackingList"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub movements: MovementColumns,
    pub snapshot: SnapshotColumns,
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// Question layer disabled (default)
    #[default]
    None,
    /// OpenAI API
    #[serde(rename = "openai")]
    OpenAI,
    /// Local OpenAI-compatible server (Ollama)
    Local,
}

impl AIProvider {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, AIProvider::OpenAI)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::OpenAI => "openai",
            AIProvider::Local => "local",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::OpenAI => "gpt-4o-mini",
            AIProvider::Local => "llama3:8b",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AIProvider::Local => "http://localhost:11434",
            AIProvider::None | AIProvider::OpenAI => "https://api.openai.com",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    pub provider: AIProvider,

    /// Model identifier; empty = provider default
    pub model: String,

    /// Override the provider's base URL
    pub endpoint: Option<String>,

    /// Cap on rows sent with a question
    pub max_rows: usize,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::None,
            model: String::new(),
            endpoint: None,
            max_rows: 500,
        }
    }
}

impl AISettings {
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub sheets: SheetSettings,
    pub columns: ColumnSettings,
    pub ai: AISettings,
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.kind == SourceKind::GoogleSheets
            && self.source.sheet_id.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Validation(
                "source.kind = \"google_sheets\" requires source.sheet_id".into(),
            ));
        }

        if self.source.kind == SourceKind::Workbook && self.source.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "source.kind = \"workbook\" requires source.path".into(),
            ));
        }

        if self.ai.max_rows == 0 {
            return Err(ConfigError::Validation("ai.max_rows must be at least 1".into()));
        }

        for (name, value) in [
            ("sheets.movements", &self.sheets.movements),
            ("sheets.snapshot", &self.sheets.snapshot),
            ("sheets.inventory", &self.sheets.inventory),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        Ok(())
    }

    /// User-level settings file
    pub fn user_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kardex")
            .join("settings.toml")
    }

    /// Locate and load settings.
    ///
    /// Order: explicit path, `./kardex.toml`, the user config file, defaults.
    /// An explicit path that does not exist is an error; the fallbacks are
    /// skipped silently. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Self::load_file(path).map(|s| (s, Some(path.to_path_buf())));
        }

        for candidate in [PathBuf::from("kardex.toml"), Self::user_config_path()] {
            if candidate.is_file() {
                log::debug!("using config {}", candidate.display());
                return Self::load_file(&candidate).map(|s| (s, Some(candidate)));
            }
        }

        log::debug!("no config file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Read one file and resolve relative source paths against its directory.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let mut settings = Self::from_toml(&contents)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        if settings.source.path.is_relative() {
            settings.source.path = base_dir.join(&settings.source.path);
        }
        Ok(settings)
    }

    /// Bearer token for remote sources, read from `source.token_env`.
    pub fn source_token(&self) -> Option<String> {
        let var = self.source.token_env.as_deref()?;
        std::env::var(var).ok().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s.source.kind, SourceKind::CsvDir);
        assert_eq!(s.sheets.movements, "Entradas y Salidas");
        assert_eq!(s.sheets.snapshot, "Inventario");
        assert_eq!(s.sheets.views.len(), 5);
        assert_eq!(s.columns.movements.client, vec!["Cliente", "client"]);
        assert_eq!(s.ai.provider, AIProvider::None);
        assert_eq!(s.ai.max_rows, 500);
    }

    #[test]
    fn full_file() {
        let s = Settings::from_toml(
            r#"
[source]
kind = "google_sheets"
sheet_id = "10vYjAS"
token_env = "KARDEX_SHEETS_TOKEN"
timeout_secs = 10

[sheets]
movements = "Movimientos"

[columns.movements]
quantity = ["Cantidad"]

[columns.snapshot]
reported_quantity = ["Existencia"]

[ai]
provider = "openai"
max_rows = 50
"#,
        )
        .unwrap();
        assert_eq!(s.source.kind, SourceKind::GoogleSheets);
        assert_eq!(s.source.sheet_id.as_deref(), Some("10vYjAS"));
        assert_eq!(s.source.timeout_secs, 10);
        assert_eq!(s.sheets.movements, "Movimientos");
        assert_eq!(s.sheets.snapshot, "Inventario");
        assert_eq!(s.columns.movements.quantity, vec!["Cantidad"]);
        // Unlisted fields keep their default aliases.
        assert_eq!(s.columns.movements.lot, vec!["Lote", "lot"]);
        assert_eq!(s.columns.snapshot.reported_quantity, vec!["Existencia"]);
        assert_eq!(s.ai.effective_model(), "gpt-4o-mini");
        assert_eq!(s.ai.effective_endpoint(), "https://api.openai.com");
    }

    #[test]
    fn google_sheets_needs_id() {
        let err = Settings::from_toml("[source]\nkind = \"google_sheets\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn unknown_provider_is_parse_error() {
        let err = Settings::from_toml("[ai]\nprovider = \"gemini\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_max_rows_rejected() {
        let err = Settings::from_toml("[ai]\nmax_rows = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn relative_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kardex.toml");
        fs::write(&path, "[source]\npath = \"data\"\n").unwrap();

        let (s, used) = Settings::load(Some(&path)).unwrap();
        assert_eq!(used.as_deref(), Some(path.as_path()));
        assert_eq!(s.source.path, dir.path().join("data"));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/kardex.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn local_provider_defaults() {
        let s = Settings::from_toml("[ai]\nprovider = \"local\"\n").unwrap();
        assert_eq!(s.ai.effective_model(), "llama3:8b");
        assert_eq!(s.ai.effective_endpoint(), "http://localhost:11434");
        assert!(!s.ai.provider.needs_api_key());
    }
}
