//! Question-driven row selection for the natural-language query layer.
//!
//! A free-text question names a client (and maybe a year); the rows handed
//! to the completion endpoint must belong to exactly that one client.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::LedgerError;
use crate::normalize::normalize_key;
use crate::table::Table;

/// Client and year extracted from a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub client: String,
    pub year: Option<String>,
}

impl Question {
    /// Detect the client and year a question refers to, against the clients
    /// present in `table`.
    pub fn resolve(
        text: &str,
        table: &Table,
        table_name: &str,
        client_aliases: &[String],
    ) -> Result<Self, LedgerError> {
        let client_idx = table.require_column(table_name, "client", client_aliases)?;
        let clients = distinct_clients(table, client_idx);
        let client = detect_client(text, &clients)
            .ok_or_else(|| LedgerError::UnknownClient(text.to_string()))?;

        Ok(Self {
            text: text.to_string(),
            client,
            year: detect_year(text),
        })
    }
}

/// Distinct normalized client values in table order. Blank cells are skipped.
pub fn distinct_clients(table: &Table, client_idx: usize) -> Vec<String> {
    let mut seen = Vec::new();
    for row in 0..table.len() {
        let client = normalize_key(table.cell(row, client_idx));
        if !client.is_empty() && !seen.contains(&client) {
            seen.push(client);
        }
    }
    seen
}

/// First client (in the given order) mentioned anywhere in the question.
pub fn detect_client(question: &str, clients: &[String]) -> Option<String> {
    let upper = question.to_uppercase();
    clients.iter().find(|c| upper.contains(c.as_str())).cloned()
}

/// First four-digit year of the form `20xx` standing alone in the question.
pub fn detect_year(question: &str) -> Option<String> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let re = YEAR.get_or_init(|| Regex::new(r"\b20\d{2}\b").expect("static year pattern"));
    re.find(question).map(|m| m.as_str().to_string())
}

/// Rows for one client, optionally restricted to dates whose text mentions
/// `year`. The year filter is skipped when the table has no date column.
///
/// Every kept row carries `client` once normalized, so the result never mixes
/// clients. An empty result is returned as an empty table; the caller decides
/// how to present "no data".
pub fn filter_rows(
    table: &Table,
    table_name: &str,
    client_aliases: &[String],
    date_aliases: &[String],
    client: &str,
    year: Option<&str>,
) -> Result<Table, LedgerError> {
    let client_idx = table.require_column(table_name, "client", client_aliases)?;
    let date_idx = table.column(date_aliases);
    let client = normalize_key(client);

    let filtered = table.filter_rows(|row| {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        if normalize_key(cell(client_idx)) != client {
            return false;
        }
        match (year, date_idx) {
            (Some(y), Some(di)) => cell(di).contains(y),
            _ => true,
        }
    });

    Ok(filtered)
}

/// Refuse a view that mixes clients. Applied to whatever is handed to the
/// model, after any truncation.
pub fn ensure_single_client(table: &Table, client_idx: usize) -> Result<(), LedgerError> {
    let clients = distinct_clients(table, client_idx);
    if clients.len() > 1 {
        return Err(LedgerError::AmbiguousClient { clients });
    }
    Ok(())
}
