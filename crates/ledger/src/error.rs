use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A column the operation depends on is absent from the input table.
    MissingRequiredField { table: String, field: String },
    /// A view that must hold exactly one client would mix several.
    AmbiguousClient { clients: Vec<String> },
    /// No known client is mentioned in a question.
    UnknownClient(String),
    /// CSV read/write error.
    Csv(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredField { table, field } => {
                write!(f, "table '{table}': missing required field '{field}'")
            }
            Self::AmbiguousClient { clients } => {
                write!(f, "mixed clients in a single-client view: {}", clients.join(", "))
            }
            Self::UnknownClient(question) => {
                write!(f, "no known client mentioned in '{question}'")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}
