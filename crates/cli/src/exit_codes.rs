//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | CLI usage error (bad args, bad date)          |
//! | 3-9     | ledger    | Source, data and reconciliation outcomes      |
//! | 10-19   | ai        | Question layer / provider codes               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use kardex_config::ConfigError;
use kardex_io::SourceError;
use kardex_ledger::LedgerError;

use crate::ask::AskError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unparseable --date.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Ledger (3-9)
// =============================================================================

/// Sheet source unreachable, sheet missing, file unreadable, output not writable.
pub const EXIT_SOURCE: u8 = 3;

/// A sheet lacks a column the operation needs.
pub const EXIT_MISSING_FIELD: u8 = 4;

/// A derived view would mix more than one client.
pub const EXIT_AMBIGUOUS_CLIENT: u8 = 5;

/// The question names no client present in the sheet.
pub const EXIT_UNKNOWN_CLIENT: u8 = 6;

/// `cuadre` found at least one DIVERGENT row.
pub const EXIT_CUADRE_DIVERGENT: u8 = 7;

/// kardex.toml unreadable or invalid.
pub const EXIT_CONFIG: u8 = 8;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none), not an error, just informational.
pub const EXIT_AI_DISABLED: u8 = 10;

/// AI provider configured but API key missing.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// Completion request failed (network, HTTP status, malformed body).
pub const EXIT_AI_REQUEST: u8 = 12;

// =============================================================================
// Error mapping
// =============================================================================

pub fn ledger_exit_code(err: &LedgerError) -> u8 {
    match err {
        LedgerError::MissingRequiredField { .. } => EXIT_MISSING_FIELD,
        LedgerError::AmbiguousClient { .. } => EXIT_AMBIGUOUS_CLIENT,
        LedgerError::UnknownClient(_) => EXIT_UNKNOWN_CLIENT,
        LedgerError::Csv(_) => EXIT_SOURCE,
    }
}

pub fn source_exit_code(_err: &SourceError) -> u8 {
    EXIT_SOURCE
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}

pub fn ask_exit_code(err: &AskError) -> u8 {
    match err {
        AskError::NotConfigured(_) => EXIT_AI_DISABLED,
        AskError::MissingKey => EXIT_AI_MISSING_KEY,
        AskError::NetworkError(_)
        | AskError::ApiError { .. }
        | AskError::ParseError(_)
        | AskError::InvalidResponse(_) => EXIT_AI_REQUEST,
    }
}
