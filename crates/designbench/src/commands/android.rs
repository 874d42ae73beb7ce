//! `designbench android`: optional Gradle install, then the adb launch
//! benchmark.

use std::path::Path;

use designbench_core::project::{self, AndroidProject};
use designbench_core::{CoreError, Platform, Report, android};

use super::Context;
use super::util;
use crate::cli::{AndroidArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Package and activity to launch plus the Gradle module they live in.
/// `module_dir` is `None` when no project was detected.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    package: String,
    activity: String,
    module_dir: Option<String>,
}

pub async fn handle(args: AndroidArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let root = util::project_root(args.project_root.as_deref())?;
    let install_task = util::non_blank(args.install_task)
        .or_else(|| ctx.config.android.install_task.clone());
    let needs_module = args.install && install_task.is_none();
    let target = resolve_target(
        &root,
        util::non_blank(args.package),
        util::non_blank(args.activity),
        needs_module,
    )?;
    tracing::info!(package = %target.package, activity = %target.activity, "android target");

    if args.install {
        let gradle = config::pick(args.gradle_path, &ctx.config.android.gradle_path);
        let task = install_task
            .or_else(|| target.module_dir.as_deref().map(android::default_install_task))
            .ok_or_else(|| CliError::MissingInput {
                platform: "Android",
                flags: "--install-task".into(),
            })?;
        if !global.quiet {
            eprintln!("Running {gradle} {task} to install Android release benchmark build...");
        }
        android::install(&ctx.invoker, &gradle, &task, &root).await?;
    }

    let component = util::resolve_component(global, &target.activity);
    let cfg = android::Config {
        component: Some(component.clone()),
        package: target.package,
        activity: target.activity,
        device_id: util::non_blank(args.device),
        adb_path: config::pick(args.adb_path, &ctx.config.android.adb_path),
        launch_args: args.launch_args,
        benchmark_component: global.view.clone(),
    };
    let metrics = android::run(&ctx.invoker, &cfg).await?;

    let report = Report::new(component, util::cli_command()).with_android(metrics);
    util::emit_report(&report, Platform::Android, ctx, global)
}

/// Fill a missing package or activity from the project manifest.
///
/// Detection runs only when something is missing, or when `needs_module`
/// asks for the Gradle module of the default install task.
fn resolve_target(
    root: &Path,
    package: Option<String>,
    activity: Option<String>,
    needs_module: bool,
) -> Result<Target, CliError> {
    let complete = package.is_some() && activity.is_some();
    let detected = if complete && !needs_module {
        None
    } else {
        Some(project::detect_android_project(root))
    };
    fill_target(package, activity, detected)
}

fn fill_target(
    package: Option<String>,
    activity: Option<String>,
    detected: Option<Result<AndroidProject, CoreError>>,
) -> Result<Target, CliError> {
    let (project, detect_err) = match detected {
        Some(Ok(project)) => {
            for warning in &project.warnings {
                tracing::warn!("{warning}");
            }
            (Some(project), None)
        }
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    let module_dir = project.as_ref().map(|p| p.module_dir.clone());
    let package = package.or_else(|| {
        project
            .as_ref()
            .map(|p| p.package.clone())
            .filter(|p| !p.is_empty())
    });
    let activity = activity.or_else(|| project.and_then(|p| p.activity));

    match (package, activity) {
        (Some(package), Some(activity)) => Ok(Target {
            package,
            activity,
            module_dir,
        }),
        (package, activity) => {
            if let Some(err) = detect_err {
                return Err(CliError::DetectionFailed {
                    what: "Android defaults",
                    flags: "--package/--activity",
                    source: Box::new(err),
                });
            }
            let missing: Vec<&str> = [
                package.is_none().then_some("--package"),
                activity.is_none().then_some("--activity"),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(CliError::MissingInput {
                platform: "Android",
                flags: missing.join(" and "),
            })
        }
    }
}
