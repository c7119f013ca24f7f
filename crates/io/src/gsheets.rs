//! Google Sheets source via the CSV export endpoint.
//!
//! One blocking HTTP client is built when the source is constructed and
//! reused for every sheet. Credentials, when needed, come from a bearer
//! token the caller resolves from the environment; nothing is re-derived
//! per request.

use std::io::Read;
use std::time::Duration;

use kardex_ledger::Table;

use crate::error::SourceError;
use crate::source::SheetSource;

const DEFAULT_BASE_URL: &str = "https://docs.google.com";
const MAX_RESPONSE_BYTES: usize = 20 * 1024 * 1024;

pub struct GoogleSheetSource {
    sheet_id: String,
    base_url: String,
    token: Option<String>,
    known_sheets: Vec<String>,
    max_bytes: usize,
    client: reqwest::blocking::Client,
}

impl GoogleSheetSource {
    /// `known_sheets` is what `sheet_names` reports; the export endpoint
    /// cannot enumerate tabs.
    pub fn new(
        sheet_id: impl Into<String>,
        token: Option<String>,
        known_sheets: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kardex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            sheet_id: sheet_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            known_sheets,
            max_bytes: MAX_RESPONSE_BYTES,
            client,
        })
    }

    /// Point at a different host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Largest export body accepted, in bytes.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn export_url(&self) -> String {
        format!("{}/spreadsheets/d/{}/gviz/tq", self.base_url, self.sheet_id)
    }
}

impl SheetSource for GoogleSheetSource {
    fn describe(&self) -> String {
        format!("google-sheets:{}", self.sheet_id)
    }

    fn sheet_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.known_sheets.clone())
    }

    fn load(&self, sheet: &str) -> Result<Table, SourceError> {
        let url = self.export_url();
        log::info!("fetching sheet '{sheet}' from {}", self.describe());

        let mut request = self
            .client
            .get(&url)
            .query(&[("tqx", "out:csv"), ("sheet", sheet)]);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| SourceError::Http(format!("{url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                source: self.describe(),
                sheet: sheet.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!(
                "{url}: HTTP {} for sheet '{sheet}'",
                status.as_u16()
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("text/html"));
        if is_html {
            // The endpoint answers with a login page when the sheet is private.
            return Err(SourceError::Http(format!(
                "{url}: sheet '{sheet}' is not published or needs a token"
            )));
        }

        let too_large = || {
            SourceError::Parse(format!(
                "sheet '{sheet}' exceeds {} bytes",
                self.max_bytes
            ))
        };
        if response
            .content_length()
            .map_or(false, |len| len > self.max_bytes as u64)
        {
            return Err(too_large());
        }

        // Read one byte past the cap so an oversized chunked body is detected
        // without buffering all of it.
        let mut bytes = Vec::new();
        response
            .take((self.max_bytes as u64).saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| SourceError::Http(format!("{url}: {e}")))?;
        if bytes.len() > self.max_bytes {
            return Err(too_large());
        }
        let body = String::from_utf8(bytes)
            .map_err(|e| SourceError::Parse(format!("sheet '{sheet}' is not UTF-8: {e}")))?;

        let table = Table::from_csv_str(&body, b',')?;
        log::debug!("sheet '{sheet}': {} rows", table.len());
        Ok(table)
    }
}
