// ── Report model ──
//
// One `Report` per CLI invocation, holding at most one metrics snapshot per
// platform. Unmeasured figures are `None` and drop out of the JSON; a figure
// measured as zero is kept.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Platform tag carried by device metadata and used in report file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

/// Identity of the device or simulator that produced a measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Display size on Android, simulator device-type identifier on iOS.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolution: String,
}

impl DeviceMetadata {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform: Some(platform),
            ..Self::default()
        }
    }

    /// True when no identifying field was filled in (the platform tag alone
    /// does not count).
    pub fn is_blank(&self) -> bool {
        self.id.is_empty()
            && self.model.is_empty()
            && self.os_version.is_empty()
            && self.resolution.is_empty()
    }

    /// Collapse a blank record to `None` so reports stay compact.
    pub fn into_present(self) -> Option<Self> {
        if self.is_blank() { None } else { Some(self) }
    }
}

/// One Android launch measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidMetrics {
    pub component: String,
    pub activity: String,
    pub package: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub benchmark_component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_frame_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_state: Option<String>,
    #[serde(default, rename = "memoryMB", skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceMetadata>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    pub timestamp: DateTime<Utc>,
}

/// One iOS launch measurement.
///
/// `render_time_ms` is the wall-clock time of `simctl launch` itself; the
/// app reports nothing back, unlike `am start -W` on Android.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosMetrics {
    pub component: String,
    pub bundle_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub launch_args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub benchmark_component: String,
    pub render_time_ms: f64,
    #[serde(default, rename = "memoryMB", skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceMetadata>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    pub timestamp: DateTime<Utc>,
}

/// Top-level unit written to disk and summarised on the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosMetrics>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cli_command: String,
}

impl Report {
    pub fn new(component: impl Into<String>, cli_command: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            android: None,
            ios: None,
            cli_command: cli_command.into(),
        }
    }

    pub fn with_android(mut self, metrics: AndroidMetrics) -> Self {
        self.android = Some(metrics);
        self
    }

    pub fn with_ios(mut self, metrics: IosMetrics) -> Self {
        self.ios = Some(metrics);
        self
    }

    /// Indented JSON, as written to the report file.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Short multi-line summary for terminal output.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Component: {}", self.component);
        if let Some(ref android) = self.android {
            let _ = writeln!(
                out,
                "  Android[{}]: total={} firstFrame={} wait={} state={}",
                model_label(android.device.as_ref()),
                fmt_figure(android.total_time_ms, "ms"),
                fmt_figure(android.first_frame_ms, "ms"),
                fmt_figure(android.wait_time_ms, "ms"),
                android.launch_state.as_deref().unwrap_or("-"),
            );
            let _ = writeln!(
                out,
                "    {}",
                resource_line(android.memory_mb, android.cpu_percent, android.cpu_time_ms)
            );
        }
        if let Some(ref ios) = self.ios {
            let _ = writeln!(
                out,
                "  iOS[{}]: render={}",
                model_label(ios.device.as_ref()),
                fmt_figure(Some(ios.render_time_ms), "ms"),
            );
            let _ = writeln!(
                out,
                "    {}",
                resource_line(ios.memory_mb, ios.cpu_percent, ios.cpu_time_ms)
            );
        }
        out
    }
}

fn model_label(device: Option<&DeviceMetadata>) -> &str {
    device
        .map(|d| d.model.as_str())
        .filter(|m| !m.is_empty())
        .unwrap_or("-")
}

fn fmt_figure(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}{unit}"))
}

fn resource_line(memory_mb: Option<f64>, cpu_percent: Option<f64>, cpu_time_ms: Option<f64>) -> String {
    format!(
        "memory={} cpu={} cpuTime={}",
        fmt_figure(memory_mb, "MB"),
        fmt_figure(cpu_percent, "%"),
        fmt_figure(cpu_time_ms, "ms"),
    )
}

// ── Report files ────────────────────────────────────────────────────

/// Default report file name: `<component>-<platform>.json`, both slugified.
pub fn default_file_name(component: &str, platform: &str) -> String {
    let component = slugify(component, "component");
    let platform = slugify(platform, "run");
    format!("{component}-{platform}.json")
}

/// Lowercase ASCII alphanumerics; any other run of characters becomes a
/// single `-`. Leading/trailing dashes are dropped; empty → `fallback`.
pub fn slugify(value: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = false;
    for ch in value.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        fallback.to_owned()
    } else {
        slug.to_owned()
    }
}

/// Write the report as indented JSON, creating parent directories.
pub fn save_json(path: &Path, report: &Report) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut json = report.to_json_pretty().map_err(|e| CoreError::Io(e.into()))?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}
