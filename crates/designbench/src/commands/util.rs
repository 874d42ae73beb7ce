//! Shared helpers for command handlers.

use std::path::{Path, PathBuf};

use designbench_core::report::{self, Report};
use designbench_core::Platform;

use super::Context;
use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// `designbench` followed by the process arguments, as recorded in reports.
pub fn cli_command() -> String {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    join_command(&args)
}

fn join_command(args: &[String]) -> String {
    std::iter::once("designbench")
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Report label: `--component`, then `--view`, then the platform fallback,
/// then `component`.
pub fn resolve_component(global: &GlobalOpts, fallback: &str) -> String {
    [global.component.as_deref(), global.view.as_deref(), Some(fallback)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|label| !label.is_empty())
        .unwrap_or("component")
        .to_owned()
}

/// `--project-root` made absolute, or the current directory.
pub fn project_root(flag: Option<&Path>) -> Result<PathBuf, CliError> {
    match flag {
        Some(dir) => Ok(std::path::absolute(dir)?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Where the report is written, creating the directory it lands in.
///
/// No `--output` gives `<reports_dir>/<component>-<platform>.json`; a
/// relative one is placed under `reports_dir`; an absolute one is kept.
pub fn resolve_report_path(
    output: Option<&Path>,
    reports_dir: &Path,
    component: &str,
    platform: Platform,
) -> Result<PathBuf, CliError> {
    let output = output.filter(|p| !p.as_os_str().is_empty());
    let path = match output {
        None => reports_dir.join(report::default_file_name(component, &platform.to_string())),
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => reports_dir.join(path),
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(path)
}

/// Print the summary (or JSON) to stdout and save the report file.
pub fn emit_report(
    report: &Report,
    platform: Platform,
    ctx: &Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    output::print_output(&output::render_report(global.format, report)?, global.quiet);

    let path = resolve_report_path(
        global.output.as_deref(),
        &ctx.config.defaults.reports_dir,
        &report.component,
        platform,
    )?;
    report::save_json(&path, report)?;
    if !global.quiet {
        eprintln!("Report saved to {}", path.display());
    }
    Ok(())
}

/// Trimmed, non-empty flag value.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
