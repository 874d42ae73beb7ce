//! `designbench devices`: attached Android devices and iOS simulators.

use serde::Serialize;
use tabled::Tabled;

use designbench_core::preflight::{self, AndroidDevice};
use designbench_core::ios::{self, SimDevice};
use designbench_core::{CoreError, Platform};

use super::Context;
use crate::cli::{DevicesArgs, GlobalOpts, PlatformFilter};
use crate::config;
use crate::error::CliError;
use crate::output;

/// One device or simulator, whichever tool reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceEntry {
    platform: Platform,
    id: String,
    name: String,
    state: String,
    os_version: String,
}

impl From<AndroidDevice> for DeviceEntry {
    fn from(device: AndroidDevice) -> Self {
        Self {
            platform: Platform::Android,
            id: device.id,
            name: device.model,
            state: device.state,
            os_version: String::new(),
        }
    }
}

impl From<&SimDevice> for DeviceEntry {
    fn from(device: &SimDevice) -> Self {
        Self {
            platform: Platform::Ios,
            id: device.udid.clone(),
            name: device.name.clone(),
            state: device.state.clone(),
            os_version: device.os_version(),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "OS")]
    os: String,
}

fn to_row(entry: &DeviceEntry) -> DeviceRow {
    let dash = |s: &str| if s.is_empty() { "-".to_owned() } else { s.to_owned() };
    DeviceRow {
        platform: entry.platform.to_string(),
        id: entry.id.clone(),
        name: dash(&entry.name),
        state: entry.state.clone(),
        os: dash(&entry.os_version),
    }
}

pub async fn handle(args: DevicesArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let all = args.platform == PlatformFilter::All;
    let mut entries = Vec::new();

    if matches!(args.platform, PlatformFilter::Android | PlatformFilter::All) {
        let adb_path = config::pick(args.adb_path, &ctx.config.android.adb_path);
        let devices = preflight::list_android_devices(&ctx.invoker, &adb_path).await;
        if let Some(devices) = tolerate(all, "adb", devices)? {
            entries.extend(devices.into_iter().map(DeviceEntry::from));
        }
    }

    if matches!(args.platform, PlatformFilter::Ios | PlatformFilter::All) {
        let xcrun_path = config::pick(args.xcrun_path, &ctx.config.ios.xcrun_path);
        let simulators = ios::list_simulators(&ctx.invoker, &xcrun_path).await;
        if let Some(list) = tolerate(all, "xcrun", simulators)? {
            entries.extend(
                list.iter()
                    .filter(|d| d.is_available || d.is_booted())
                    .map(DeviceEntry::from),
            );
        }
    }

    let out = output::render_list(global.format, &entries, to_row, |e| e.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// With every platform requested, one missing tool only costs its rows;
/// a timeout still aborts.
fn tolerate<T>(all: bool, tool: &str, result: Result<T, CoreError>) -> Result<Option<T>, CliError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if all && !err.is_timeout() => {
            tracing::warn!(tool, error = %err, "skipping device listing");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
