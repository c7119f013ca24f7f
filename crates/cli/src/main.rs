// Kardex CLI - movement ledger, daily summaries and stock reconciliation
// over the spreadsheet a warehouse already keeps

mod ask;
mod context;
mod cuadre;
mod exit_codes;
mod inventory;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kardex_config::ConfigError;
use kardex_io::SourceError;
use kardex_ledger::LedgerError;

use ask::AskError;
use context::Context;
use exit_codes::{
    ask_exit_code, config_exit_code, ledger_exit_code, source_exit_code, EXIT_AI_DISABLED,
    EXIT_AI_MISSING_KEY, EXIT_ERROR, EXIT_SOURCE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "kardex")]
#[command(about = "Inventory movement ledger and stock reconciliation (cuadre) over sheet data")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: ./kardex.toml, then the user config directory)
    #[arg(long, global = true, env = "KARDEX_CONFIG")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug); KARDEX_LOG overrides
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured views and the sheets the source exposes
    #[command(after_help = "\
Examples:
  kardex sheets
  kardex sheets --config ~/bodega/kardex.toml")]
    Sheets,

    /// Print any sheet as a table (the sheet browser)
    #[command(after_help = "\
Examples:
  kardex show Inventario
  kardex show 'Entradas y Salidas' --json | jq '.rows | length'")]
    Show {
        /// Sheet name as the source knows it
        sheet: String,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Running balance (kardex) for one client, optionally one model
    #[command(after_help = "\
Examples:
  kardex ledger --client DAEWON
  kardex ledger --client sjm --model A1
  kardex ledger --client SJM --output sjm-kardex.csv")]
    Ledger {
        /// Client to report on (case and surrounding spaces are ignored)
        #[arg(long)]
        client: String,

        /// Restrict to one model
        #[arg(long)]
        model: Option<String>,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,

        /// Write the result to a file (.csv for CSV, anything else JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Inflow, outflow and net per client for one day
    #[command(after_help = "\
Examples:
  kardex daily --date 2025-01-05
  kardex daily --date 05/01/2025 --rows
  kardex daily --date 2025-01-05 --json")]
    Daily {
        /// Day to summarize (YYYY-MM-DD, DD/MM/YYYY, ...)
        #[arg(long)]
        date: String,

        /// Also print the movements that fell on that day
        #[arg(long)]
        rows: bool,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,

        /// Write the result to a file (.csv for CSV, anything else JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Reconcile implied balances against the stock snapshot (exit 7 = divergences)
    #[command(after_help = "\
Exit code 7 means at least one (client, model, lot) differs between the \
movement log and the reported stock.

Examples:
  kardex cuadre
  kardex cuadre --divergent-only
  kardex cuadre --json --output cuadre.json")]
    Cuadre {
        /// Only list DIVERGENT rows (the summary still counts everything)
        #[arg(long)]
        divergent_only: bool,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,

        /// Write the result to a file (.csv for CSV, anything else JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Ask a question about one client's data
    #[command(after_help = "\
The question must name a client present in the sheet. Only that client's rows \
are sent to the model.

Examples:
  kardex ask 'cuanto stock tiene SJM del modelo A1?'
  kardex ask 'DAEWON movimientos 2025' --dry-run
  kardex ask 'diferencias de SJM' --view cuadre")]
    Ask {
        /// Free-text question naming a client
        question: String,

        /// Data the question is answered from
        #[arg(long, value_enum, default_value = "inventory")]
        view: AskView,

        /// Print the prompt instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// AI configuration and diagnostics
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check AI configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AskView {
    /// The stock snapshot sheet
    Inventory,
    /// The reconciliation table
    Cuadre,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::new().filter("KARDEX_LOG"))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: kardex <command> [options]");
            eprintln!("       kardex --help for more information");
            Ok(())
        }
        // AI diagnostics need settings only, never the sheet source.
        Some(Commands::Ai { command }) => kardex_config::Settings::load(config)
            .map_err(CliError::from)
            .and_then(|(settings, path)| cmd_ai(&settings, path.as_deref(), command)),
        Some(command) => Context::open(config).and_then(|ctx| run(&ctx, command)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(ctx: &Context, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Sheets => inventory::cmd_sheets(ctx),
        Commands::Show { sheet, json } => inventory::cmd_show(ctx, &sheet, json),
        Commands::Ledger { client, model, json, output } => {
            inventory::cmd_ledger(ctx, &client, model.as_deref(), json, output.as_deref())
        }
        Commands::Daily { date, rows, json, output } => {
            inventory::cmd_daily(ctx, &date, rows, json, output.as_deref())
        }
        Commands::Cuadre { divergent_only, json, output } => {
            cuadre::cmd_cuadre(ctx, divergent_only, json, output.as_deref())
        }
        Commands::Ask { question, view, dry_run } => ask::cmd_ask(ctx, &question, view, dry_run),
        Commands::Ai { command } => cmd_ai(&ctx.settings, ctx.config_path.as_deref(), command),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_SOURCE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        let code = ledger_exit_code(&err);
        let hint = match &err {
            LedgerError::MissingRequiredField { table, .. } => Some(format!(
                "map the header under [columns.{table}] in kardex.toml"
            )),
            LedgerError::AmbiguousClient { .. } => {
                Some("name exactly one client in the question".to_string())
            }
            LedgerError::UnknownClient(_) => {
                Some("the question must mention a client exactly as the sheet spells it".to_string())
            }
            LedgerError::Csv(_) => None,
        };
        let message = match &err {
            LedgerError::UnknownClient(_) => "client does not exist in the sheet".to_string(),
            _ => err.to_string(),
        };
        Self { code, message, hint }
    }
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        let hint = match &err {
            SourceError::NotFound { .. } => {
                Some("check [sheets] in kardex.toml, or run `kardex sheets`".to_string())
            }
            SourceError::Http(_) => {
                Some("check source.sheet_id and that the sheet is shared or a token is set".to_string())
            }
            _ => None,
        };
        Self { code: source_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(config_exit_code(&err), err.to_string())
    }
}

impl From<AskError> for CliError {
    fn from(err: AskError) -> Self {
        let hint = match &err {
            AskError::NotConfigured(_) => Some("set ai.provider in kardex.toml".to_string()),
            AskError::MissingKey => Some(kardex_config::ai::missing_key_hint("openai")),
            _ => None,
        };
        Self { code: ask_exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// ai doctor
// ============================================================================

fn cmd_ai(
    settings: &kardex_config::Settings,
    config_path: Option<&std::path::Path>,
    command: AiCommands,
) -> Result<(), CliError> {
    match command {
        AiCommands::Doctor { json } => cmd_ai_doctor(settings, config_path, json),
    }
}

fn cmd_ai_doctor(
    settings: &kardex_config::Settings,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> Result<(), CliError> {
    use kardex_config::ai::{self, AIConfigStatus, ResolvedAIConfig};

    let resolved = ResolvedAIConfig::from_settings(&settings.ai);

    if json {
        let report = serde_json::json!({
            "schema_version": 1,
            "config": config_path.map(|p| p.display().to_string()),
            "status": resolved.status.as_str(),
            "blocking_reason": resolved.blocking_reason,
            "provider": resolved.provider.name(),
            "model": resolved.model,
            "endpoint": resolved.endpoint,
            "max_rows": resolved.max_rows,
            "key": if resolved.api_key.is_some() { "present" } else { "missing" },
            "key_source": resolved.key_source.as_str(),
            "keychain": if ai::keychain_available() { "ok" } else { "unavailable" },
        });
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        match config_path {
            Some(path) => println!("config:            {}", path.display()),
            None => println!("config:            (defaults)"),
        }
        print!("{resolved}");
    }

    match resolved.status {
        AIConfigStatus::Ready => Ok(()),
        AIConfigStatus::Disabled => Err(CliError::new(EXIT_AI_DISABLED, "AI is disabled")),
        AIConfigStatus::MissingKey => Err(CliError::new(
            EXIT_AI_MISSING_KEY,
            resolved
                .blocking_reason
                .unwrap_or_else(|| "missing API key".to_string()),
        )),
    }
}
