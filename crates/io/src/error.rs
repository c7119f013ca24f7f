use std::fmt;

#[derive(Debug)]
pub enum SourceError {
    /// The requested sheet does not exist in the source.
    NotFound { source: String, sheet: String },
    /// Local file could not be read.
    Io(String),
    /// Content could not be parsed as a table.
    Parse(String),
    /// Remote fetch failed (network or non-2xx status).
    Http(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { source, sheet } => write!(f, "{source}: sheet '{sheet}' not found"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Http(msg) => write!(f, "HTTP error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<kardex_ledger::LedgerError> for SourceError {
    fn from(e: kardex_ledger::LedgerError) -> Self {
        Self::Parse(e.to_string())
    }
}
