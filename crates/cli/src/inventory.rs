//! `kardex sheets | show | ledger | daily` — read-only views over the
//! movement log and the configured sheets.

use std::path::Path;

use kardex_ledger::normalize::{normalize_key, parse_date};
use kardex_ledger::render::{daily_table, ledger_table, movements_table};
use kardex_ledger::{compute_ledger, summarize_day};

use crate::context::Context;
use crate::output;
use crate::CliError;

pub fn cmd_sheets(ctx: &Context) -> Result<(), CliError> {
    let available = ctx.source.sheet_names()?;
    eprintln!("source: {}", ctx.source.describe());

    println!("views:");
    for view in &ctx.settings.sheets.views {
        let state = if available.iter().any(|s| s == view) { "ok" } else { "missing" };
        println!("  {view:<32} {state}");
    }

    let others: Vec<&String> = available
        .iter()
        .filter(|s| !ctx.settings.sheets.views.contains(s))
        .collect();
    if !others.is_empty() {
        println!("other sheets:");
        for sheet in others {
            println!("  {sheet}");
        }
    }
    Ok(())
}

pub fn cmd_show(ctx: &Context, sheet: &str, json: bool) -> Result<(), CliError> {
    let table = ctx.load_sheet(sheet)?;
    if json {
        println!("{}", output::to_json(&table)?);
    } else {
        print!("{}", table.to_text());
    }
    eprintln!("{sheet}: {} rows", table.len());
    Ok(())
}

pub fn cmd_ledger(
    ctx: &Context,
    client: &str,
    model: Option<&str>,
    json: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    let log = ctx.movement_log()?;
    let entries = compute_ledger(&log, client, model)?;

    let table = ledger_table(&entries);
    output::emit(&table, &entries, json, output_file)?;

    let label = match model {
        Some(m) => format!("{} / {}", normalize_key(client), normalize_key(m)),
        None => normalize_key(client),
    };
    match entries.last() {
        Some(last) => eprintln!(
            "kardex {label}: {} movements, closing balance {}",
            entries.len(),
            last.running_balance
        ),
        None => eprintln!("kardex {label}: no movements"),
    }
    Ok(())
}

pub fn cmd_daily(
    ctx: &Context,
    date: &str,
    rows: bool,
    json: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    let day = parse_date(date).ok_or_else(|| {
        CliError::args(format!("cannot parse date: \"{date}\""))
            .with_hint("use YYYY-MM-DD or DD/MM/YYYY")
    })?;

    let log = ctx.movement_log()?;
    let summary = summarize_day(&log, day);

    let table = daily_table(&summary.totals);
    output::emit(&table, &summary, json, output_file)?;

    if rows && !json {
        println!();
        print!("{}", movements_table(&summary.rows).to_text());
    }

    eprintln!(
        "{}: {} movements across {} clients",
        day.format("%Y-%m-%d"),
        summary.rows.len(),
        summary.totals.len()
    );
    Ok(())
}
