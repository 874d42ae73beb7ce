// ── iOS simulator parsers ──
//
// Pure functions over `xcrun simctl` output: the JSON device listing and
// the text printed by `memory_usage`, `launchctl list` and `ps` inside the
// simulator.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::report::{DeviceMetadata, Platform};

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(bytes|b|kb|kib|mb|mib|gb|gib)")
        .expect("size pattern is a valid regex")
});

// ── Device listing ──────────────────────────────────────────────────

/// One simulator as reported by `simctl list devices --json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimDevice {
    pub udid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub device_type_identifier: String,
    #[serde(default)]
    pub is_available: bool,
    /// Runtime key the device was listed under; filled in after decoding.
    #[serde(default)]
    pub runtime: String,
}

impl SimDevice {
    pub fn is_booted(&self) -> bool {
        self.state.eq_ignore_ascii_case("booted")
    }

    /// Human OS label derived from the runtime key (`iOS 17.2`).
    pub fn os_version(&self) -> String {
        if self.runtime.is_empty() {
            String::new()
        } else {
            runtime_to_version(&self.runtime)
        }
    }

    pub fn to_metadata(&self) -> DeviceMetadata {
        DeviceMetadata {
            id: self.udid.clone(),
            model: self.name.clone(),
            os_version: self.os_version(),
            resolution: self.device_type_identifier.clone(),
            ..DeviceMetadata::new(Platform::Ios)
        }
    }
}

#[derive(Deserialize)]
struct SimctlPayload {
    #[serde(default)]
    devices: BTreeMap<String, Vec<SimDevice>>,
}

/// Simulators grouped by runtime key, iterated in sorted runtime order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorList {
    by_runtime: BTreeMap<String, Vec<SimDevice>>,
}

impl SimulatorList {
    /// Look a simulator up by UDID.
    pub fn get(&self, udid: &str) -> Option<&SimDevice> {
        self.iter().find(|dev| dev.udid == udid)
    }

    /// First booted simulator, scanning runtimes in sorted key order.
    pub fn first_booted(&self) -> Option<&SimDevice> {
        self.iter().find(|dev| dev.is_booted())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimDevice> {
        self.by_runtime.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_runtime.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode `simctl list devices --json`, tagging each device with its runtime.
pub fn parse_simctl_devices(json: &str) -> Result<SimulatorList, CoreError> {
    let payload: SimctlPayload = serde_json::from_str(json).map_err(|source| CoreError::Decode {
        what: "simctl device list",
        source,
    })?;
    let mut by_runtime = payload.devices;
    for (runtime, devices) in &mut by_runtime {
        for device in devices {
            device.runtime.clone_from(runtime);
        }
    }
    Ok(SimulatorList { by_runtime })
}

/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2` → `iOS 17.2`.
pub fn runtime_to_version(runtime: &str) -> String {
    let trimmed = runtime.strip_prefix(RUNTIME_PREFIX).unwrap_or(runtime);
    let normalized = trimmed.replace('_', "-");
    let mut parts = normalized.split('-');
    let name = parts.next().unwrap_or_default();
    let version: Vec<&str> = parts.collect();
    if version.is_empty() {
        return normalized.trim().to_owned();
    }

    let name = match name.to_ascii_lowercase().as_str() {
        "ios" => "iOS".to_owned(),
        "ipados" => "iPadOS".to_owned(),
        "tvos" => "tvOS".to_owned(),
        lower => capitalize(lower),
    };
    format!("{name} {}", version.join(".")).trim().to_owned()
}

fn capitalize(lower: &str) -> String {
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Memory ──────────────────────────────────────────────────────────

/// Physical footprint in MB from `memory_usage -b <bundle>`.
pub fn parse_memory_mb(output: &str) -> Result<f64, CoreError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("physical") && lower.contains("footprint")
        })
        .find_map(parse_size_mb)
        .ok_or_else(|| CoreError::not_found("physical footprint"))
}

/// First `<number><unit>` on the line, converted to MB.
pub fn parse_size_mb(line: &str) -> Option<f64> {
    let caps = SIZE_PATTERN.captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "bytes" | "b" => 1.0 / (1024.0 * 1024.0),
        "kb" | "kib" => 1.0 / 1024.0,
        "mb" | "mib" => 1.0,
        "gb" | "gib" => 1024.0,
        _ => return None,
    };
    Some(value * scale)
}

// ── CPU ─────────────────────────────────────────────────────────────

/// Pid of the `launchctl list` entry whose label contains `bundle_id`.
///
/// Rows are `PID Status Label`; entries without a running process show `-`.
pub fn parse_launchctl_pid(output: &str, bundle_id: &str) -> Result<String, CoreError> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return None;
            }
            let label = fields.last()?;
            let pid = fields.first()?;
            (label.contains(bundle_id) && pid.bytes().all(|b| b.is_ascii_digit()))
                .then(|| (*pid).to_owned())
        })
        .next()
        .ok_or_else(|| CoreError::not_found(format!("launchctl entry for {bundle_id}")))
}

/// CPU percent and CPU time (ms) from `ps -o pid,pcpu,time -p <pid>`.
pub fn parse_ps_metrics(output: &str, pid: &str) -> Result<(f64, f64), CoreError> {
    let rows = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1);
    for row in rows {
        let fields: Vec<&str> = row.split_whitespace().collect();
        let [row_pid, pcpu, time, ..] = fields.as_slice() else {
            continue;
        };
        if *row_pid != pid {
            continue;
        }
        let percent = pcpu.parse::<f64>().map_err(|e| CoreError::Malformed {
            what: "ps %CPU column",
            reason: format!("{pcpu:?}: {e}"),
        })?;
        return Ok((percent, parse_darwin_time_ms(time)?));
    }
    Err(CoreError::not_found(format!("pid {pid} in ps output")))
}

/// Darwin `ps` TIME column to ms: `MM:SS`, `HH:MM:SS` or `D-HH:MM:SS`,
/// seconds may be fractional.
pub fn parse_darwin_time_ms(value: &str) -> Result<f64, CoreError> {
    let malformed = |reason: String| CoreError::Malformed {
        what: "ps TIME column",
        reason,
    };
    let number = |part: &str| {
        part.parse::<f64>()
            .map_err(|e| malformed(format!("{value:?}: {e}")))
    };

    let (days, clock) = match value.split_once('-') {
        Some((days, clock)) => (number(days)?, clock),
        None => (0.0, value),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let seconds = match parts.as_slice() {
        [minutes, seconds] => number(minutes)? * 60.0 + number(seconds)?,
        [hours, minutes, seconds] => {
            number(hours)? * 3600.0 + number(minutes)? * 60.0 + number(seconds)?
        }
        _ => return Err(malformed(format!("unsupported time format {value:?}"))),
    };
    Ok((days * 24.0 * 3600.0 + seconds) * 1000.0)
}
