// Natural-language questions over one client's rows
//
// The question picks a client (and maybe a year), the rows are narrowed to
// that client, and the flattened table goes to an OpenAI-compatible
// chat-completions endpoint. The answer is opaque text.

use std::time::Duration;

use kardex_config::ai::ResolvedAIConfig;
use kardex_config::settings::AIProvider;
use kardex_ledger::query::{ensure_single_client, filter_rows, Question};
use kardex_ledger::render::reconciliation_table;
use kardex_ledger::{reconcile, Table};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::{AskView, CliError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error from a question round-trip
#[derive(Debug, Clone)]
pub enum AskError {
    /// Provider not configured
    NotConfigured(String),
    /// API key missing
    MissingKey,
    /// Network error
    NetworkError(String),
    /// API error response
    ApiError { status: u16, message: String },
    /// Failed to parse response
    ParseError(String),
    /// Provider returned unexpected format
    InvalidResponse(String),
}

impl std::fmt::Display for AskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AskError::NotConfigured(msg) => write!(f, "AI not configured: {}", msg),
            AskError::MissingKey => write!(f, "API key not configured"),
            AskError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AskError::ApiError { status, message } => write!(f, "API error ({}): {}", status, message),
            AskError::ParseError(msg) => write!(f, "Failed to parse response: {}", msg),
            AskError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for AskError {}

// ============================================================================
// Chat-completions wire types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Prompt
// ============================================================================

const ROLE_LINE: &str = "You are an expert logistics and inventory analyst.";

/// Single user message: role, one client's data, the question, the rules.
pub fn build_prompt(client: &str, data: &Table, question: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(ROLE_LINE);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "The following data belongs to a single client: {client}.\n"
    ));
    prompt.push_str("DATA:\n");
    prompt.push_str(&data.to_text());
    prompt.push('\n');

    prompt.push_str("QUESTION:\n");
    prompt.push_str(question);
    prompt.push_str("\n\n");

    prompt.push_str("RULES:\n");
    prompt.push_str("- Do not invent clients.\n");
    prompt.push_str("- Do not assume relationships between clients, models or lots that the data does not show.\n");
    prompt.push_str("- If the information is insufficient to answer, say so.\n");
    prompt
}

// ============================================================================
// Client
// ============================================================================

/// Blocking chat-completions client, built once per invocation.
pub struct ChatClient {
    url: String,
    model: String,
    api_key: Option<String>,
    http: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(config: &ResolvedAIConfig) -> Result<Self, AskError> {
        match config.provider {
            AIProvider::None => {
                return Err(AskError::NotConfigured("AI is disabled".to_string()));
            }
            AIProvider::OpenAI if config.api_key.is_none() => return Err(AskError::MissingKey),
            AIProvider::OpenAI | AIProvider::Local => {}
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AskError::NetworkError(e.to_string()))?;

        Ok(Self {
            url: config.completions_url(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    pub fn complete(&self, prompt: &str) -> Result<String, AskError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.2,
        };

        log::info!("POST {} (model {})", self.url, self.model);
        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .map_err(|e| AskError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AskError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        parse_completion(&body)
    }
}

fn api_error(status: u16, body: &str) -> AskError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    AskError::ApiError { status, message }
}

/// First choice's message content, trimmed.
fn parse_completion(body: &str) -> Result<String, AskError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AskError::ParseError(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AskError::InvalidResponse("No choices in response".to_string()))?;

    let answer = content.trim();
    if answer.is_empty() {
        return Err(AskError::InvalidResponse("Empty answer".to_string()));
    }
    Ok(answer.to_string())
}

// ============================================================================
// kardex ask
// ============================================================================

/// The rows actually sent: at most `max_rows`, refused if they mix clients.
fn model_payload(
    rows: &Table,
    table_name: &str,
    client_aliases: &[String],
    max_rows: usize,
) -> Result<Table, CliError> {
    let data = rows.head(max_rows);
    let client_idx = data.require_column(table_name, "client", client_aliases)?;
    ensure_single_client(&data, client_idx)?;
    Ok(data)
}

/// Rows the question may see, with the aliases to find client and date in them.
fn view_table(ctx: &Context, view: AskView) -> Result<(Table, &'static str, Vec<String>, Vec<String>), CliError> {
    let settings = &ctx.settings;
    match view {
        AskView::Inventory => Ok((
            ctx.load_sheet(&settings.sheets.inventory)?,
            "inventory",
            settings.columns.snapshot.client.clone(),
            settings.columns.movements.date.clone(),
        )),
        AskView::Cuadre => {
            let report = reconcile(&ctx.movement_log()?, &ctx.snapshot()?)?;
            Ok((
                reconciliation_table(&report.rows),
                "cuadre",
                vec!["client".to_string()],
                Vec::new(),
            ))
        }
    }
}

pub fn cmd_ask(ctx: &Context, question: &str, view: AskView, dry_run: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::from_settings(&ctx.settings.ai);

    // Refuse early so a disabled setup never touches the source.
    let client = if dry_run { None } else { Some(ChatClient::new(&config)?) };

    let (table, table_name, client_aliases, date_aliases) = view_table(ctx, view)?;
    let resolved = Question::resolve(question, &table, table_name, &client_aliases)?;
    log::info!(
        "question resolved to client {} (year {})",
        resolved.client,
        resolved.year.as_deref().unwrap_or("any")
    );

    let rows = filter_rows(
        &table,
        table_name,
        &client_aliases,
        &date_aliases,
        &resolved.client,
        resolved.year.as_deref(),
    )?;

    if rows.is_empty() {
        eprintln!("no rows for {} in {table_name}", resolved.client);
        return Ok(());
    }

    if rows.len() > config.max_rows {
        eprintln!(
            "note: sending the first {} of {} rows (ai.max_rows)",
            config.max_rows,
            rows.len()
        );
    }
    let data = model_payload(&rows, table_name, &client_aliases, config.max_rows)?;
    let prompt = build_prompt(&resolved.client, &data, question);

    match client {
        None => {
            print!("{prompt}");
            Ok(())
        }
        Some(chat) => {
            let answer = chat.complete(&prompt)?;
            println!("{answer}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kardex_config::settings::AISettings;

    fn sjm_rows() -> Table {
        Table::from_records(
            vec!["Cliente".to_string(), "Modelo".to_string(), "Piezas en stock".to_string()],
            vec![vec!["SJM", "A1", "65"]],
        )
    }

    #[test]
    fn prompt_contains_role_data_question_and_rules() {
        let prompt = build_prompt("SJM", &sjm_rows(), "cuanto stock tiene SJM?");
        assert!(prompt.starts_with(ROLE_LINE));
        assert!(prompt.contains("single client: SJM"));
        assert!(prompt.contains("Piezas en stock"));
        assert!(prompt.contains("cuanto stock tiene SJM?"));
        assert!(prompt.contains("Do not invent clients"));
        assert!(prompt.contains("Do not assume relationships"));
        assert!(prompt.contains("insufficient"));
    }

    #[test]
    fn payload_is_truncated_and_single_client() {
        let aliases = vec!["Cliente".to_string()];
        let rows = Table::from_records(
            vec!["Cliente".to_string(), "Modelo".to_string()],
            vec![vec!["SJM", "A1"], vec!["sjm ", "B2"], vec!["DAEWON", "X1"]],
        );

        let data = model_payload(&rows, "inventory", &aliases, 2).unwrap();
        assert_eq!(data.len(), 2);

        let err = model_payload(&rows, "inventory", &aliases, 10).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_AMBIGUOUS_CLIENT);
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  SJM tiene 65 piezas.\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "SJM tiene 65 piezas.");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let body = r#"{"choices":[]}"#;
        assert!(matches!(parse_completion(body), Err(AskError::InvalidResponse(_))));
        assert!(matches!(parse_completion("not json"), Err(AskError::ParseError(_))));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        match api_error(401, body) {
            AskError::ApiError { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected {other:?}"),
        }
        match api_error(502, "bad gateway") {
            AskError::ApiError { message, .. } => assert_eq!(message, "bad gateway"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn client_refuses_disabled_and_keyless() {
        let disabled = ResolvedAIConfig::resolve(&AISettings::default(), |_| {
            kardex_config::ai::KeyLookup { key: None, source: kardex_config::ai::KeySource::None }
        });
        assert!(matches!(ChatClient::new(&disabled), Err(AskError::NotConfigured(_))));

        let keyless = ResolvedAIConfig::resolve(
            &AISettings { provider: AIProvider::OpenAI, ..AISettings::default() },
            |_| kardex_config::ai::KeyLookup { key: None, source: kardex_config::ai::KeySource::None },
        );
        assert!(matches!(ChatClient::new(&keyless), Err(AskError::MissingKey)));
    }

    #[test]
    fn unreachable_endpoint_is_network_error() {
        let settings = AISettings {
            provider: AIProvider::Local,
            endpoint: Some("http://127.0.0.1:9".into()),
            ..AISettings::default()
        };
        let config = ResolvedAIConfig::resolve(&settings, |_| kardex_config::ai::KeyLookup {
            key: None,
            source: kardex_config::ai::KeySource::None,
        });
        let client = ChatClient::new(&config).unwrap();
        assert!(matches!(client.complete("hola"), Err(AskError::NetworkError(_))));
    }
}
