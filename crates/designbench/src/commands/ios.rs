//! `designbench ios`: simctl launch benchmark.

use std::path::Path;

use designbench_core::{Platform, Report, ios, project};

use super::Context;
use super::util;
use crate::cli::{GlobalOpts, IosArgs};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: IosArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let bundle_id = match util::non_blank(args.bundle) {
        Some(bundle_id) => bundle_id,
        None => detect_bundle_id(&util::project_root(args.project_root.as_deref())?)?,
    };
    tracing::info!(%bundle_id, "ios target");

    let component = util::resolve_component(global, &bundle_id);
    let cfg = ios::Config {
        component: Some(component.clone()),
        bundle_id,
        device_id: util::non_blank(args.device),
        launch_args: args.launch_args,
        xcrun_path: config::pick(args.xcrun_path, &ctx.config.ios.xcrun_path),
        benchmark_component: global.view.clone(),
    };
    let metrics = ios::run(&ctx.invoker, &cfg).await?;

    let report = Report::new(component, util::cli_command()).with_ios(metrics);
    util::emit_report(&report, Platform::Ios, ctx, global)
}

fn detect_bundle_id(root: &Path) -> Result<String, CliError> {
    project::detect_ios_project(root)
        .map(|proj| proj.bundle_id)
        .map_err(|err| CliError::DetectionFailed {
            what: "iOS bundle id",
            flags: "--bundle",
            source: Box::new(err),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bundle_id_from_info_plist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("iosApp")).unwrap();
        std::fs::write(
            dir.path().join("iosApp/Info.plist"),
            "<plist><dict>\n<key>CFBundleIdentifier</key>\n<string>com.example.shop</string>\n</dict></plist>",
        )
        .unwrap();

        assert_eq!(detect_bundle_id(dir.path()).unwrap(), "com.example.shop");
    }

    #[test]
    fn empty_bundle_id_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Info.plist"),
            "<key>CFBundleIdentifier</key><string></string>",
        )
        .unwrap();

        let err = detect_bundle_id(dir.path()).unwrap_err();

        assert!(matches!(err, CliError::DetectionFailed { flags: "--bundle", .. }));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
