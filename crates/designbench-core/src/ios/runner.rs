// ── iOS launch benchmark ──
//
// Times `simctl launch` on a resolved simulator, then probes memory and CPU
// inside the simulator with `simctl spawn`.

use chrono::Utc;
use tokio::time::Instant;
use tracing::info;

use super::parse::{self, SimulatorList};
use crate::error::{CoreError, optional};
use crate::exec::{Invoker, ToolCommand};
use crate::report::{DeviceMetadata, IosMetrics, Platform};

/// Environment variable `simctl` forwards to the launched app as
/// `DESIGNBENCH_COMPONENT`.
pub const COMPONENT_ENV: &str = "SIMCTL_CHILD_DESIGNBENCH_COMPONENT";

/// Inputs for one iOS launch measurement.
#[derive(Debug, Clone)]
pub struct Config {
    /// Report label; defaults to the bundle id.
    pub component: Option<String>,
    pub bundle_id: String,
    /// Simulator UDID (or physical device id). Defaults to the first booted
    /// simulator.
    pub device_id: Option<String>,
    pub launch_args: Vec<String>,
    pub xcrun_path: String,
    pub benchmark_component: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component: None,
            bundle_id: String::new(),
            device_id: None,
            launch_args: Vec::new(),
            xcrun_path: "xcrun".into(),
            benchmark_component: None,
        }
    }
}

/// Launch the bundle on the resolved device and collect metrics.
pub async fn run(invoker: &Invoker, cfg: &Config) -> Result<IosMetrics, CoreError> {
    if cfg.bundle_id.trim().is_empty() {
        return Err(CoreError::MissingInput {
            what: "ios bundle id",
        });
    }

    let simctl = Simctl::new(invoker, &cfg.xcrun_path);
    let device = resolve_device(invoker, simctl.path, cfg.device_id.as_deref()).await?;
    if device.id.is_empty() {
        return Err(CoreError::NoBootedSimulator);
    }
    info!(device = %device.id, model = %device.model, "resolved ios device");

    let benchmark_component = cfg
        .benchmark_component
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let mut launch = simctl
        .command()
        .args(["launch", device.id.as_str(), cfg.bundle_id.as_str()])
        .args(cfg.launch_args.iter().cloned());
    if let Some(view) = benchmark_component {
        launch = launch.env(COMPONENT_ENV, view);
    }

    let started = Instant::now();
    invoker.combined(&launch).await?;
    let render_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(bundle = %cfg.bundle_id, render_ms = render_time_ms, "ios launch complete");

    let memory_mb = optional(
        "memory",
        collect_memory(&simctl, &device.id, &cfg.bundle_id).await,
    )?;
    let cpu = optional("cpu", collect_cpu(&simctl, &device.id, &cfg.bundle_id).await)?;
    let (cpu_percent, cpu_time_ms) = cpu.map_or((None, None), |(p, t)| (Some(p), Some(t)));

    Ok(IosMetrics {
        component: cfg
            .component
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&cfg.bundle_id)
            .to_owned(),
        bundle_id: cfg.bundle_id.clone(),
        launch_args: cfg.launch_args.clone(),
        benchmark_component: benchmark_component.unwrap_or_default().to_owned(),
        render_time_ms,
        memory_mb,
        cpu_percent,
        cpu_time_ms,
        device: device.into_present(),
        command: launch.to_string(),
        timestamp: Utc::now(),
    })
}

/// Decode `simctl list devices --json`.
pub async fn list_simulators(invoker: &Invoker, xcrun_path: &str) -> Result<SimulatorList, CoreError> {
    let cmd = ToolCommand::new(xcrun_path).args(["simctl", "list", "devices", "--json"]);
    let output = invoker.output(&cmd).await?;
    parse::parse_simctl_devices(&output.stdout_text())
}

/// Resolve the target device.
///
/// A requested id missing from the simulator list is assumed to be a
/// physical device. Without a request the first booted simulator wins; a
/// failed listing then degrades to blank metadata.
pub async fn resolve_device(
    invoker: &Invoker,
    xcrun_path: &str,
    requested: Option<&str>,
) -> Result<DeviceMetadata, CoreError> {
    let requested = requested.map(str::trim).filter(|id| !id.is_empty());
    let list = match (list_simulators(invoker, xcrun_path).await, requested) {
        (Ok(list), _) => list,
        (Err(err), None) if !err.is_timeout() => {
            tracing::debug!(error = %err, "simulator listing unavailable");
            return Ok(DeviceMetadata::new(Platform::Ios));
        }
        (Err(err), _) => return Err(err),
    };

    let meta = match requested {
        Some(id) => list.get(id).map_or_else(
            || DeviceMetadata {
                id: id.to_owned(),
                ..DeviceMetadata::new(Platform::Ios)
            },
            parse::SimDevice::to_metadata,
        ),
        None => list
            .first_booted()
            .map_or_else(|| DeviceMetadata::new(Platform::Ios), parse::SimDevice::to_metadata),
    };
    Ok(meta)
}

// ── Probes ──────────────────────────────────────────────────────────

struct Simctl<'a> {
    invoker: &'a Invoker,
    path: &'a str,
}

impl<'a> Simctl<'a> {
    fn new(invoker: &'a Invoker, path: &'a str) -> Self {
        let path = if path.trim().is_empty() { "xcrun" } else { path };
        Self { invoker, path }
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(self.path).arg("simctl")
    }

    async fn spawn(&self, device: &str, args: &[&str]) -> Result<String, CoreError> {
        let cmd = self
            .command()
            .args(["spawn", device])
            .args(args.iter().copied());
        self.invoker.combined(&cmd).await
    }
}

async fn collect_memory(simctl: &Simctl<'_>, device: &str, bundle_id: &str) -> Result<f64, CoreError> {
    let output = simctl
        .spawn(device, &["memory_usage", "-b", bundle_id])
        .await?;
    parse::parse_memory_mb(&output)
}

async fn collect_cpu(simctl: &Simctl<'_>, device: &str, bundle_id: &str) -> Result<(f64, f64), CoreError> {
    let listing = simctl.spawn(device, &["launchctl", "list"]).await?;
    let pid = parse::parse_launchctl_pid(&listing, bundle_id)?;
    info!(%pid, "resolved ios pid");
    let output = simctl
        .spawn(device, &["ps", "-o", "pid,pcpu,time", "-p", pid.as_str()])
        .await?;
    parse::parse_ps_metrics(&output, &pid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_bundle_fails_before_spawning() {
        let cfg = Config {
            xcrun_path: "designbench-no-such-xcrun".into(),
            ..Config::default()
        };
        let err = run(&Invoker::default(), &cfg).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn unlisted_request_fails_when_listing_fails() {
        let err = resolve_device(&Invoker::default(), "designbench-no-such-xcrun", Some("ABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Spawn { .. }));
    }

    #[tokio::test]
    async fn listing_failure_without_request_degrades() {
        let meta = resolve_device(&Invoker::default(), "designbench-no-such-xcrun", None)
            .await
            .unwrap();
        assert!(meta.is_blank());
    }

    #[tokio::test]
    async fn no_booted_simulator_is_fatal() {
        let cfg = Config {
            bundle_id: "com.example".into(),
            xcrun_path: "designbench-no-such-xcrun".into(),
            ..Config::default()
        };
        let err = run(&Invoker::default(), &cfg).await.unwrap_err();
        assert!(matches!(err, CoreError::NoBootedSimulator));
    }
}
