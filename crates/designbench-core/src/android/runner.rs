// ── Android launch benchmark ──
//
// `am start -W` provides the timing; device identity, memory and CPU come
// from separate best-effort probes that leave their fields unset on failure.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info};

use super::parse;
use crate::error::{CoreError, optional};
use crate::exec::{Invoker, ToolCommand};
use crate::report::{AndroidMetrics, DeviceMetadata, Platform};

/// Intent extra carrying the benchmark view id.
pub const COMPONENT_EXTRA: &str = "designbench_component";

/// Inputs for one Android launch measurement.
#[derive(Debug, Clone)]
pub struct Config {
    /// Report label; defaults to the activity.
    pub component: Option<String>,
    pub package: String,
    /// `.Main`, `com.example.Main` or a full `pkg/.Main` component.
    pub activity: String,
    pub device_id: Option<String>,
    pub adb_path: String,
    /// Extra arguments appended to `am start`.
    pub launch_args: Vec<String>,
    pub benchmark_component: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component: None,
            package: String::new(),
            activity: String::new(),
            device_id: None,
            adb_path: "adb".into(),
            launch_args: Vec::new(),
            benchmark_component: None,
        }
    }
}

/// Launch the activity, parse its timing and collect supporting metrics.
pub async fn run(invoker: &Invoker, cfg: &Config) -> Result<AndroidMetrics, CoreError> {
    if cfg.package.trim().is_empty() {
        return Err(CoreError::MissingInput {
            what: "android package name",
        });
    }
    if cfg.activity.trim().is_empty() {
        return Err(CoreError::MissingInput {
            what: "android activity",
        });
    }

    let adb = Adb::new(invoker, &cfg.adb_path, cfg.device_id.as_deref());
    let benchmark_component = non_empty(cfg.benchmark_component.as_deref());

    let mut launch = adb
        .command()
        .args(["shell", "am", "start", "-W"])
        .arg(component_arg(&cfg.package, &cfg.activity));
    if let Some(view) = benchmark_component {
        launch = launch.args(["-e", COMPONENT_EXTRA, view]);
    }
    let launch = launch.args(cfg.launch_args.iter().cloned());

    let output = invoker.combined(&launch).await?;
    let timing = parse::parse_launch_output(&output);
    info!(
        package = %cfg.package,
        total_ms = ?timing.total_time_ms,
        state = ?timing.launch_state,
        "android launch complete"
    );

    let device = fetch_device_metadata(&adb).await?;
    let memory_mb = optional("memory", collect_memory(&adb, &cfg.package).await)?;
    let cpu = optional("cpu", collect_cpu(&adb, &cfg.package).await)?;
    let (cpu_percent, cpu_time_ms) = cpu.unwrap_or_default();

    Ok(AndroidMetrics {
        component: non_empty(cfg.component.as_deref())
            .unwrap_or(&cfg.activity)
            .to_owned(),
        activity: cfg.activity.clone(),
        package: cfg.package.clone(),
        benchmark_component: benchmark_component.unwrap_or_default().to_owned(),
        first_frame_ms: timing.first_frame_ms,
        total_time_ms: timing.total_time_ms,
        wait_time_ms: timing.wait_time_ms,
        launch_state: timing.launch_state,
        memory_mb,
        cpu_percent,
        cpu_time_ms,
        device,
        command: launch.to_string(),
        timestamp: Utc::now(),
    })
}

/// `pkg/activity` as passed to `am start`.
///
/// An activity that already names a component is used as-is; one prefixed
/// with the package is shortened to the `.Name` form.
pub fn component_arg(package: &str, activity: &str) -> String {
    if activity.contains('/') {
        return activity.to_owned();
    }
    format!("{package}/{}", normalize_activity(package, activity))
}

fn normalize_activity<'a>(package: &str, activity: &'a str) -> &'a str {
    if activity.starts_with('.') || package.is_empty() {
        return activity;
    }
    match activity.strip_prefix(package) {
        Some(rest) if rest.starts_with('.') => rest,
        _ => activity,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ── Gradle install ──────────────────────────────────────────────────

/// Default Gradle install task for a module directory relative to the
/// project root (`app` → `:app:installRelease`).
pub fn default_install_task(module_dir: &str) -> String {
    let module = module_dir.replace('\\', "/");
    let module = module.trim().trim_matches('/');
    if module.is_empty() {
        "installRelease".into()
    } else {
        format!(":{}:installRelease", module.replace('/', ":"))
    }
}

/// Run the Gradle install task from `project_root` with output streamed to
/// the terminal. `task` may hold several whitespace-separated arguments.
pub async fn install(
    invoker: &Invoker,
    gradle_path: &str,
    task: &str,
    project_root: &Path,
) -> Result<(), CoreError> {
    let args: Vec<&str> = task.split_whitespace().collect();
    if args.is_empty() {
        return Err(CoreError::MissingInput {
            what: "gradle install task",
        });
    }
    let cmd = ToolCommand::new(gradle_path)
        .args(args)
        .current_dir(project_root);
    info!(command = %cmd, "installing android build");
    invoker.status(&cmd).await
}

// ── Probes ──────────────────────────────────────────────────────────

struct Adb<'a> {
    invoker: &'a Invoker,
    path: &'a str,
    device: Option<&'a str>,
}

impl<'a> Adb<'a> {
    fn new(invoker: &'a Invoker, path: &'a str, device: Option<&'a str>) -> Self {
        let path = if path.trim().is_empty() { "adb" } else { path };
        Self {
            invoker,
            path,
            device,
        }
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(self.path).selector("-s", self.device)
    }

    async fn shell(&self, args: &[&str]) -> Result<String, CoreError> {
        let cmd = self.command().arg("shell").args(args.iter().copied());
        self.invoker.combined(&cmd).await
    }
}

async fn fetch_device_metadata(adb: &Adb<'_>) -> Result<Option<DeviceMetadata>, CoreError> {
    let model = optional("model", adb.shell(&["getprop", "ro.product.model"]).await)?;
    let os_version = optional(
        "os version",
        adb.shell(&["getprop", "ro.build.version.release"]).await,
    )?;
    let resolution = optional("resolution", adb.shell(&["wm", "size"]).await)?;

    let meta = DeviceMetadata {
        id: adb.device.map(str::trim).unwrap_or_default().to_owned(),
        model: model.as_deref().map(str::trim).unwrap_or_default().to_owned(),
        os_version: os_version
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_owned(),
        resolution: resolution.as_deref().map(parse::parse_wm_size).unwrap_or_default(),
        ..DeviceMetadata::new(Platform::Android)
    };
    Ok(meta.into_present())
}

async fn collect_memory(adb: &Adb<'_>, package: &str) -> Result<f64, CoreError> {
    let output = adb.shell(&["dumpsys", "meminfo", package]).await?;
    parse::parse_meminfo_mb(&output)
}

/// CPU percent and CPU time; fails only when neither is available.
async fn collect_cpu(adb: &Adb<'_>, package: &str) -> Result<(Option<f64>, Option<f64>), CoreError> {
    let pid = resolve_pid(adb, package).await?;
    info!(%pid, "resolved android pid");

    let percent = optional("cpu percent", cpu_percent(adb, &pid, package).await)?;
    let time = optional("cpu time", cpu_time(adb, &pid).await)?;
    if percent.is_none() && time.is_none() {
        return Err(CoreError::not_found(format!("cpu metrics for pid {pid}")));
    }
    Ok((percent, time))
}

async fn resolve_pid(adb: &Adb<'_>, package: &str) -> Result<String, CoreError> {
    match adb.shell(&["pidof", package]).await {
        Ok(output) => {
            if let Some(pid) = parse::parse_pidof(&output) {
                return Ok(pid);
            }
        }
        Err(err) if err.is_timeout() => return Err(err),
        Err(err) => debug!(error = %err, "pidof failed, scanning ps"),
    }
    let output = adb.shell(&["ps"]).await?;
    parse::parse_ps_pid(&output, package)
}

async fn cpu_percent(adb: &Adb<'_>, pid: &str, package: &str) -> Result<f64, CoreError> {
    let top = adb.shell(&["top", "-b", "-n", "1", "-p", pid]).await;
    match top.and_then(|output| parse::parse_top_cpu(&output, pid)) {
        Ok(value) => return Ok(value),
        Err(err) if err.is_timeout() => return Err(err),
        Err(err) => debug!(error = %err, "top unavailable, falling back to dumpsys cpuinfo"),
    }
    let output = adb.shell(&["dumpsys", "cpuinfo"]).await?;
    parse::parse_dumpsys_cpu(&output, package)
}

async fn cpu_time(adb: &Adb<'_>, pid: &str) -> Result<f64, CoreError> {
    let stat_path = format!("/proc/{pid}/stat");
    let output = adb.shell(&["cat", stat_path.as_str()]).await?;
    parse::parse_proc_stat_cpu_ms(&output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn component_arg_forms() {
        assert_eq!(component_arg("com.example", ".MainActivity"), "com.example/.MainActivity");
        assert_eq!(
            component_arg("com.example", "com.example.ui.MainActivity"),
            "com.example/.ui.MainActivity"
        );
        assert_eq!(
            component_arg("com.example", "org.other.Activity"),
            "com.example/org.other.Activity"
        );
        assert_eq!(
            component_arg("com.example", "com.example/.MainActivity"),
            "com.example/.MainActivity"
        );
    }

    #[test]
    fn package_prefix_needs_a_dot_boundary() {
        assert_eq!(
            component_arg("com.example", "com.examples.Main"),
            "com.example/com.examples.Main"
        );
    }

    #[test]
    fn install_task_from_module_dir() {
        assert_eq!(default_install_task(""), "installRelease");
        assert_eq!(default_install_task("app"), ":app:installRelease");
        assert_eq!(default_install_task("/apps/shop/"), ":apps:shop:installRelease");
        assert_eq!(default_install_task("apps\\shop"), ":apps:shop:installRelease");
    }

    #[tokio::test]
    async fn missing_package_fails_before_spawning() {
        let cfg = Config {
            activity: ".Main".into(),
            adb_path: "designbench-no-such-adb".into(),
            ..Config::default()
        };
        let err = run(&Invoker::default(), &cfg).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { what } if what.contains("package")));
    }

    #[tokio::test]
    async fn missing_activity_fails_before_spawning() {
        let cfg = Config {
            package: "com.example".into(),
            adb_path: "designbench-no-such-adb".into(),
            ..Config::default()
        };
        let err = run(&Invoker::default(), &cfg).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { what } if what.contains("activity")));
    }

    #[tokio::test]
    async fn empty_install_task_is_rejected() {
        let err = install(&Invoker::default(), "./gradlew", "  ", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { .. }));
    }
}
