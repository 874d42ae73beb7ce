//! Output formatting: summary, table, JSON, plain.
//!
//! Renders data in the format selected by `--format`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use designbench_core::Report;
use designbench_core::preflight::{CheckItem, CheckStatus};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

fn status_label(status: CheckStatus, color: bool) -> String {
    let label = format!("[{status}]");
    if !color {
        return label;
    }
    match status {
        CheckStatus::Pass => label.green().bold().to_string(),
        CheckStatus::Warn => label.yellow().bold().to_string(),
        CheckStatus::Fail => label.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: maps each item through `to_row` and builds a `tabled` table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a benchmark report: the text summary for `table`/`plain`, the
/// report JSON otherwise.
pub fn render_report(format: OutputFormat, report: &Report) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table | OutputFormat::Plain => report.summary().trim_end().to_owned(),
        OutputFormat::Json => report.to_json_pretty()?,
        OutputFormat::JsonCompact => serde_json::to_string(report)?,
    })
}

/// `[PASS] name` lines, each followed by its indented notes.
pub fn render_checklist(items: &[CheckItem], color: bool) -> String {
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{} {}", status_label(item.status, color), item.name);
        for note in &item.notes {
            let _ = writeln!(out, "    - {note}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
