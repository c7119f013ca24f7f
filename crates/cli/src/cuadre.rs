//! `kardex cuadre` — implied balances vs. the stock snapshot.

use std::path::Path;

use kardex_ledger::render::reconciliation_table;
use kardex_ledger::{reconcile, ReconciliationRow};

use crate::context::Context;
use crate::exit_codes::EXIT_CUADRE_DIVERGENT;
use crate::output;
use crate::CliError;

pub fn cmd_cuadre(
    ctx: &Context,
    divergent_only: bool,
    json: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    let log = ctx.movement_log()?;
    let snapshot = ctx.snapshot()?;
    let report = reconcile(&log, &snapshot)?;

    let shown: Vec<&ReconciliationRow> = if divergent_only {
        report.divergent().collect()
    } else {
        report.rows.iter().collect()
    };

    let table = reconciliation_table(shown.iter().copied());
    let value = serde_json::json!({
        "summary": report.summary,
        "rows": shown,
    });
    output::emit(&table, &value, json, output_file)?;

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "cuadre: {} keys, {} matched, {} divergent",
        s.total_keys, s.matched, s.divergent,
    );
    if s.snapshot_only > 0 {
        eprintln!(
            "note: {} snapshot keys have no movements and are not listed",
            s.snapshot_only
        );
    }

    if s.divergent > 0 {
        return Err(CliError::new(
            EXIT_CUADRE_DIVERGENT,
            format!("{} divergent keys", s.divergent),
        ));
    }
    Ok(())
}
