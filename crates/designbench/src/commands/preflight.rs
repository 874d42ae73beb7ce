//! `designbench preflight`: readiness checklist. Always succeeds once the
//! checks have run; problems are reported as WARN/FAIL items.

use serde::Serialize;

use designbench_core::preflight::{self, CheckItem, Options};

use super::Context;
use super::util;
use crate::cli::{GlobalOpts, OutputFormat, PreflightArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Checklist<'a> {
    root: String,
    items: &'a [CheckItem],
}

pub async fn handle(args: PreflightArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let root = util::project_root(args.project_root.as_deref())?;
    let opts = Options {
        root: root.clone(),
        adb_path: config::pick(args.adb_path, &ctx.config.android.adb_path),
        xcrun_path: config::pick(args.xcrun_path, &ctx.config.ios.xcrun_path),
    };
    let items = preflight::run_checklist(&ctx.invoker, &opts).await;

    let rendered = match global.format {
        OutputFormat::Table | OutputFormat::Plain => format!(
            "Preflight checklist (root: {})\n\n{}",
            root.display(),
            output::render_checklist(&items, ctx.color)
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&Checklist {
            root: root.display().to_string(),
            items: &items,
        })?,
        OutputFormat::JsonCompact => serde_json::to_string(&Checklist {
            root: root.display().to_string(),
            items: &items,
        })?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
