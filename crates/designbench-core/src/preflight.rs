// ── Preflight checks ──
//
// Readiness checklist run before benchmarking: tool binaries on PATH,
// detectable projects and an attached device or booted simulator. Every
// check produces an item; nothing here fails the command.

use std::path::{Path, PathBuf};

use serde::Serialize;
use strum::Display;

use crate::error::CoreError;
use crate::exec::{Invoker, ToolCommand};
use crate::ios::{self, SimDevice};
use crate::project;

// ── adb devices ─────────────────────────────────────────────────────

/// One row of `adb devices -l`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidDevice {
    pub id: String,
    /// `device`, `offline`, `unauthorized`, ...
    pub state: String,
    pub model: String,
    pub product: String,
    /// The raw row.
    pub description: String,
}

impl AndroidDevice {
    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }
}

/// Parse `adb devices -l`, skipping the header and daemon `*` lines.
pub fn parse_adb_devices(output: &str) -> Vec<AndroidDevice> {
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let state = fields.next()?;
            let mut device = AndroidDevice {
                id: id.to_owned(),
                state: state.to_owned(),
                description: line.to_owned(),
                ..AndroidDevice::default()
            };
            for field in fields {
                if let Some(model) = field.strip_prefix("model:") {
                    model.clone_into(&mut device.model);
                } else if let Some(product) = field.strip_prefix("product:") {
                    product.clone_into(&mut device.product);
                }
            }
            Some(device)
        })
        .collect()
}

pub async fn list_android_devices(invoker: &Invoker, adb_path: &str) -> Result<Vec<AndroidDevice>, CoreError> {
    let cmd = ToolCommand::new(adb_path).args(["devices", "-l"]);
    let output = invoker.combined(&cmd).await?;
    Ok(parse_adb_devices(&output))
}

/// First attached device in the `device` state.
pub async fn detect_android_device(
    invoker: &Invoker,
    adb_path: &str,
) -> Result<Option<AndroidDevice>, CoreError> {
    let devices = list_android_devices(invoker, adb_path).await?;
    Ok(devices.into_iter().find(AndroidDevice::is_ready))
}

/// First booted simulator, in runtime order.
pub async fn detect_ios_device(invoker: &Invoker, xcrun_path: &str) -> Result<Option<SimDevice>, CoreError> {
    let list = ios::list_simulators(invoker, xcrun_path).await?;
    Ok(list.first_booted().cloned())
}

// ── Checklist ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckItem {
    pub name: String,
    pub status: CheckStatus,
    pub notes: Vec<String>,
}

impl CheckItem {
    fn new(name: &str, status: CheckStatus, notes: Vec<String>) -> Self {
        Self {
            name: name.to_owned(),
            status,
            notes,
        }
    }
}

/// Where to look for projects and which tool binaries to probe.
#[derive(Debug, Clone)]
pub struct Options {
    pub root: PathBuf,
    pub adb_path: String,
    pub xcrun_path: String,
}

/// Run every check in a fixed order.
pub async fn run_checklist(invoker: &Invoker, opts: &Options) -> Vec<CheckItem> {
    let android_device = detect_android_device(invoker, &opts.adb_path).await;
    let ios_device = detect_ios_device(invoker, &opts.xcrun_path).await;
    vec![
        check_binary("adb available", &opts.adb_path),
        check_binary("xcodebuild available", "xcodebuild"),
        check_binary("xcrun available", &opts.xcrun_path),
        android_project_item(&opts.root),
        android_device_item(android_device),
        ios_project_item(&opts.root),
        ios_device_item(ios_device),
    ]
}

/// PASS with the resolved path when `program` is found on PATH (or is an
/// existing path itself).
pub fn check_binary(label: &str, program: &str) -> CheckItem {
    if program.trim().is_empty() {
        return CheckItem::new(label, CheckStatus::Fail, vec!["no path configured".into()]);
    }
    match which::which(program) {
        Ok(path) => CheckItem::new(label, CheckStatus::Pass, vec![format!("path: {}", path.display())]),
        Err(err) => CheckItem::new(label, CheckStatus::Fail, vec![format!("{program}: {err}")]),
    }
}

fn android_project_item(root: &Path) -> CheckItem {
    const NAME: &str = "Android project";
    match project::detect_android_project(root) {
        Ok(proj) => {
            let mut notes = vec![format!("Package: {}", proj.package)];
            if let Some(activity) = proj.activity {
                notes.push(format!("Activity: {activity}"));
            }
            if !proj.module_dir.is_empty() {
                notes.push(format!("Gradle module: {}", proj.module_dir));
            }
            notes.extend(proj.warnings);
            CheckItem::new(NAME, CheckStatus::Pass, notes)
        }
        Err(CoreError::ProjectNotFound { .. }) => CheckItem::new(
            NAME,
            CheckStatus::Warn,
            vec!["AndroidManifest.xml not found (run from project root?)".into()],
        ),
        Err(err) => CheckItem::new(NAME, CheckStatus::Fail, vec![err.to_string()]),
    }
}

fn android_device_item(device: Result<Option<AndroidDevice>, CoreError>) -> CheckItem {
    const NAME: &str = "Android device detected";
    match device {
        Ok(Some(device)) if device.model.is_empty() => {
            CheckItem::new(NAME, CheckStatus::Pass, vec![device.id])
        }
        Ok(Some(device)) => CheckItem::new(
            NAME,
            CheckStatus::Pass,
            vec![format!("{} ({})", device.id, device.model)],
        ),
        Ok(None) => CheckItem::new(
            NAME,
            CheckStatus::Warn,
            vec!["No devices reported by `adb devices -l`.".into()],
        ),
        Err(err) => CheckItem::new(NAME, CheckStatus::Fail, vec![err.to_string()]),
    }
}

fn ios_project_item(root: &Path) -> CheckItem {
    const NAME: &str = "iOS project";
    match project::detect_ios_project(root) {
        Ok(proj) => CheckItem::new(
            NAME,
            CheckStatus::Pass,
            vec![
                format!("Bundle ID: {}", proj.bundle_id),
                format!("Info.plist: {}", proj.info_plist_path.display()),
            ],
        ),
        Err(CoreError::ProjectNotFound { .. }) => {
            CheckItem::new(NAME, CheckStatus::Warn, vec!["Info.plist not found".into()])
        }
        Err(err) => CheckItem::new(NAME, CheckStatus::Fail, vec![err.to_string()]),
    }
}

fn ios_device_item(device: Result<Option<SimDevice>, CoreError>) -> CheckItem {
    const NAME: &str = "iOS device detected";
    match device {
        Ok(Some(device)) => {
            let mut desc = device.udid.clone();
            if !device.name.is_empty() {
                desc = format!("{desc} ({})", device.name);
            }
            let os = device.os_version();
            if !os.is_empty() {
                desc = format!("{desc} - {os}");
            }
            CheckItem::new(NAME, CheckStatus::Pass, vec![desc])
        }
        Ok(None) => CheckItem::new(
            NAME,
            CheckStatus::Warn,
            vec!["No booted simulator or connected device reported by xcrun.".into()],
        ),
        Err(err) => CheckItem::new(NAME, CheckStatus::Fail, vec![err.to_string()]),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DEVICES: &str = "List of devices attached\n\
                           * daemon not running; starting now at tcp:5037\n\
                           * daemon started successfully\n\
                           R58M123ABC     unauthorized usb:1-1 transport_id:2\n\
                           emulator-5554  device product:sdk_gphone64 model:Pixel_7 device:emu64a transport_id:1\n\
                           \n";

    #[test]
    fn adb_devices_rows() {
        let devices = parse_adb_devices(DEVICES);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].state, "unauthorized");
        assert!(!devices[0].is_ready());
        assert_eq!(
            devices[1],
            AndroidDevice {
                id: "emulator-5554".into(),
                state: "device".into(),
                model: "Pixel_7".into(),
                product: "sdk_gphone64".into(),
                description: "emulator-5554  device product:sdk_gphone64 model:Pixel_7 device:emu64a transport_id:1"
                    .into(),
            }
        );
    }

    #[test]
    fn adb_devices_empty_list() {
        assert!(parse_adb_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn status_labels() {
        assert_eq!(CheckStatus::Pass.to_string(), "PASS");
        assert_eq!(CheckStatus::Warn.to_string(), "WARN");
        assert_eq!(
            serde_json::to_string(&CheckStatus::Fail).unwrap(),
            "\"FAIL\""
        );
    }

    #[test]
    fn unconfigured_binary_fails() {
        let item = check_binary("adb available", " ");
        assert_eq!(item.status, CheckStatus::Fail);
        assert_eq!(item.notes, vec!["no path configured".to_owned()]);
        let item = check_binary("adb available", "designbench-no-such-binary-91c2");
        assert_eq!(item.status, CheckStatus::Fail);
    }

    #[test]
    fn missing_projects_warn() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(android_project_item(dir.path()).status, CheckStatus::Warn);
        assert_eq!(ios_project_item(dir.path()).status, CheckStatus::Warn);
    }

    #[test]
    fn device_items() {
        let item = android_device_item(Ok(None));
        assert_eq!(item.status, CheckStatus::Warn);
        let device = AndroidDevice {
            id: "emulator-5554".into(),
            state: "device".into(),
            model: "Pixel_7".into(),
            ..AndroidDevice::default()
        };
        assert_eq!(android_device_item(Ok(Some(device))).notes, vec!["emulator-5554 (Pixel_7)".to_owned()]);

        let sim = SimDevice {
            udid: "BBB-222".into(),
            name: "iPhone 15".into(),
            state: "Booted".into(),
            runtime: "com.apple.CoreSimulator.SimRuntime.iOS-17-2".into(),
            ..SimDevice::default()
        };
        assert_eq!(
            ios_device_item(Ok(Some(sim))).notes,
            vec!["BBB-222 (iPhone 15) - iOS 17.2".to_owned()]
        );
        let err = ios_device_item(Err(CoreError::NoBootedSimulator));
        assert_eq!(err.status, CheckStatus::Fail);
    }
}
