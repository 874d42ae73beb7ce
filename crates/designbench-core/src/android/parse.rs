// ── Android diagnostic parsers ──
//
// Pure functions over raw `adb shell` output. Each returns a typed value or
// `CoreError::NotFound` / `CoreError::Malformed`; none of them panic on
// unexpected input.

use crate::error::CoreError;

/// Clock ticks per second assumed for `/proc/<pid>/stat` (USER_HZ).
pub const CLOCK_TICKS_PER_SECOND: f64 = 100.0;

/// Timing figures reported by `am start -W`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchTiming {
    pub first_frame_ms: Option<f64>,
    pub total_time_ms: Option<f64>,
    pub wait_time_ms: Option<f64>,
    pub launch_state: Option<String>,
}

/// Parse the `key: value` lines printed by `am start -W`.
///
/// Unknown keys are ignored and a malformed number leaves its field unset.
pub fn parse_launch_output(output: &str) -> LaunchTiming {
    let mut timing = LaunchTiming::default();
    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "ThisTime" => timing.first_frame_ms = value.parse().ok(),
            "TotalTime" => timing.total_time_ms = value.parse().ok(),
            "WaitTime" => timing.wait_time_ms = value.parse().ok(),
            "LaunchState" if !value.is_empty() => timing.launch_state = Some(value.to_owned()),
            _ => {}
        }
    }
    timing
}

/// Reduce `wm size` output to the `WxH` figure.
///
/// An `Override size` line wins over `Physical size`; anything else is kept
/// verbatim.
pub fn parse_wm_size(output: &str) -> String {
    let size_for = |label: &str| {
        output.lines().find_map(|line| {
            line.trim()
                .strip_prefix(label)
                .map(str::trim)
                .filter(|size| !size.is_empty())
        })
    };
    size_for("Override size:")
        .or_else(|| size_for("Physical size:"))
        .unwrap_or_else(|| output.trim())
        .to_owned()
}

// ── Memory ──────────────────────────────────────────────────────────

/// Total PSS in MB from `dumpsys meminfo <pkg>`.
///
/// A `TOTAL PSS` line is preferred; otherwise the first `TOTAL` line with a
/// numeric field is used. Values are kB.
pub fn parse_meminfo_mb(output: &str) -> Result<f64, CoreError> {
    let mut first_total = None;
    for line in output.lines().map(str::trim) {
        let upper = line.to_ascii_uppercase();
        if !upper.starts_with("TOTAL") {
            continue;
        }
        let Some(kb) = first_kb_figure(line) else {
            continue;
        };
        if upper.starts_with("TOTAL PSS") {
            return Ok(kb / 1024.0);
        }
        first_total.get_or_insert(kb);
    }
    first_total
        .map(|kb| kb / 1024.0)
        .ok_or_else(|| CoreError::not_found("TOTAL line in dumpsys meminfo output"))
}

fn first_kb_figure(line: &str) -> Option<f64> {
    let values = line.split_once(':').map_or(line, |(_, rest)| rest);
    values.split_whitespace().find_map(|field| {
        let clean = ["kB", "KB", "kb"]
            .iter()
            .find_map(|suffix| field.strip_suffix(suffix))
            .unwrap_or(field);
        clean.parse::<f64>().ok()
    })
}

// ── Process lookup ──────────────────────────────────────────────────

/// First pid printed by `pidof`.
pub fn parse_pidof(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .next()
        .filter(|pid| is_pid(pid))
        .map(str::to_owned)
}

/// Pid of the first `ps` row mentioning `package`.
///
/// The pid is the first numeric field on the row, which covers both the
/// bare `PID ...` layout and toybox's `USER PID PPID ...`.
pub fn parse_ps_pid(output: &str, package: &str) -> Result<String, CoreError> {
    output
        .lines()
        .filter(|line| line.contains(package))
        .find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return None;
            }
            fields.into_iter().find(|f| is_pid(f)).map(str::to_owned)
        })
        .ok_or_else(|| CoreError::not_found(format!("process for {package}")))
}

fn is_pid(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

// ── CPU ─────────────────────────────────────────────────────────────

/// CPU percent for `pid` from `top -b -n 1 -p <pid>`.
///
/// Takes the first `%`-suffixed field on the pid's row. Toybox prints bare
/// numbers, so the column under the `%CPU` header is the fallback; a
/// combined `S[%CPU]` header spans two row fields.
pub fn parse_top_cpu(output: &str, pid: &str) -> Result<f64, CoreError> {
    let mut cpu_column = None;
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some((&first, rest)) = fields.split_first() else {
            continue;
        };
        if let Some(column) = cpu_header_column(&fields) {
            cpu_column = Some(column);
            continue;
        }
        if first != pid {
            continue;
        }
        let percent = rest
            .iter()
            .filter(|f| f.contains('%'))
            .find_map(|f| f.trim_end_matches('%').parse::<f64>().ok());
        if let Some(value) = percent {
            return Ok(value);
        }
        if let Some(value) = cpu_column
            .and_then(|col| fields.get(col))
            .and_then(|f| f.parse::<f64>().ok())
        {
            return Ok(value);
        }
    }
    Err(CoreError::not_found(format!("pid {pid} in top output")))
}

fn cpu_header_column(fields: &[&str]) -> Option<usize> {
    let index = fields.iter().position(|f| f.contains("%CPU"))?;
    let header = fields.get(index)?;
    if header.starts_with("%CPU") || header.starts_with("[%CPU") {
        Some(index)
    } else {
        Some(index + 1)
    }
}

/// CPU percent for `package` from `dumpsys cpuinfo` (`12.5% 4242/pkg: ...`).
pub fn parse_dumpsys_cpu(output: &str, package: &str) -> Result<f64, CoreError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(package))
        .find_map(|line| {
            line.split_whitespace()
                .next()
                .and_then(|first| first.trim_end_matches('%').parse::<f64>().ok())
        })
        .ok_or_else(|| CoreError::not_found(format!("{package} in cpuinfo output")))
}

/// User + system CPU time in ms from `/proc/<pid>/stat`.
///
/// Fields are counted after the last `)` so a command name containing
/// spaces does not shift `utime` / `stime`.
pub fn parse_proc_stat_cpu_ms(output: &str) -> Result<f64, CoreError> {
    let rest: Vec<&str> = match output.rfind(')') {
        Some(idx) => output[idx + 1..].split_whitespace().collect(),
        None => output.split_whitespace().skip(2).collect(),
    };
    let (Some(utime), Some(stime)) = (rest.get(11).copied(), rest.get(12).copied()) else {
        return Err(CoreError::Malformed {
            what: "/proc stat",
            reason: format!("expected at least 15 fields, got {}", rest.len() + 2),
        });
    };
    let ticks = |field: &str| {
        field.parse::<f64>().map_err(|e| CoreError::Malformed {
            what: "/proc stat",
            reason: format!("{field:?}: {e}"),
        })
    };
    let total = ticks(utime)? + ticks(stime)?;
    Ok(total / CLOCK_TICKS_PER_SECOND * 1000.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn launch_output_fields() {
        let output = "Starting: Intent { cmp=com.example/.MainActivity }\n\
                      Status: ok\n\
                      LaunchState: COLD\n\
                      Activity: com.example/.MainActivity\n\
                      ThisTime: 8\n\
                      TotalTime: 12\n\
                      WaitTime: 14\n\
                      Complete\n";
        assert_eq!(
            parse_launch_output(output),
            LaunchTiming {
                first_frame_ms: Some(8.0),
                total_time_ms: Some(12.0),
                wait_time_ms: Some(14.0),
                launch_state: Some("COLD".into()),
            }
        );
    }

    #[test]
    fn launch_output_malformed_number_is_unset() {
        let timing = parse_launch_output("TotalTime: twelve\nWaitTime: 3.5\n");
        assert_eq!(timing.total_time_ms, None);
        assert_eq!(timing.wait_time_ms, Some(3.5));
        assert_eq!(timing.launch_state, None);
    }

    #[test]
    fn wm_size_prefers_override() {
        assert_eq!(parse_wm_size("Physical size: 1080x2400\n"), "1080x2400");
        assert_eq!(
            parse_wm_size("Physical size: 1080x2400\nOverride size: 720x1600\n"),
            "720x1600"
        );
        assert_eq!(parse_wm_size("  something odd \n"), "something odd");
    }

    #[test]
    fn meminfo_total_line() {
        let output = "Applications Memory Usage (in Kilobytes):\n\
                      ** MEMINFO in pid 4242 [com.example] **\n\
                      \x20       TOTAL  4096  2048  0  0\n";
        assert_eq!(parse_meminfo_mb(output).unwrap(), 4.0);
    }

    #[test]
    fn meminfo_prefers_total_pss() {
        let output = "   TOTAL    8192    100\n\
                      \x20 TOTAL PSS:    5120            TOTAL RSS:   90000\n";
        assert_eq!(parse_meminfo_mb(output).unwrap(), 5.0);
    }

    #[test]
    fn meminfo_strips_kb_suffix() {
        assert_eq!(parse_meminfo_mb("TOTAL: 2048kB\n").unwrap(), 2.0);
    }

    #[test]
    fn meminfo_missing_total_is_not_found() {
        let err = parse_meminfo_mb("No process found for: com.example\n").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn pidof_first_token() {
        assert_eq!(parse_pidof("4242 4243\n").as_deref(), Some("4242"));
        assert_eq!(parse_pidof("\n"), None);
        assert_eq!(parse_pidof("pidof: bad\n"), None);
    }

    #[test]
    fn ps_pid_from_toybox_layout() {
        let output = "USER           PID  PPID     VSZ    RSS WCHAN  ADDR S NAME\n\
                      root             1     0 1234567  4321 0      0 S init\n\
                      u0_a123       4242   612 9876543 65432 0      0 S com.example.shop\n";
        assert_eq!(parse_ps_pid(output, "com.example.shop").unwrap(), "4242");
    }

    #[test]
    fn ps_pid_missing_package() {
        let err = parse_ps_pid("root 1 0 init\n", "com.example").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn top_percent_suffixed_field() {
        let output = "  PID USER  PR  NI CPU% S  #THR     VSS     RSS PCY Name\n\
                      \x204242 u0_a1 10 -10  3.5% S    20 123456K  65432K  fg com.example\n";
        assert_eq!(parse_top_cpu(output, "4242").unwrap(), 3.5);
    }

    #[test]
    fn top_toybox_header_column() {
        let output = "Tasks: 1 total\n\
                      \x20 PID USER         PR  NI VIRT  RES  SHR S[%CPU] %MEM     TIME+ ARGS\n\
                      \x204242 u0_a123      10 -10 1.2G 100M  50M S  7.0   1.2   0:01.23 com.example\n";
        assert_eq!(parse_top_cpu(output, "4242").unwrap(), 7.0);
    }

    #[test]
    fn top_without_pid_row() {
        let err = parse_top_cpu("  PID USER %CPU\n", "4242").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn dumpsys_cpu_line() {
        let output = "Load: 1.0 / 0.9 / 0.8\n\
                      CPU usage from 5000ms to 0ms ago:\n\
                      \x20 12.5% 4242/com.example: 10% user + 2.5% kernel\n";
        assert_eq!(parse_dumpsys_cpu(output, "com.example").unwrap(), 12.5);
    }

    #[test]
    fn proc_stat_ticks_to_ms() {
        let stat = "4242 (mock) S 0 0 0 0 0 0 0 0 0 0 100 50 0 0 20 0 1 0";
        assert_eq!(parse_proc_stat_cpu_ms(stat).unwrap(), 1500.0);
    }

    #[test]
    fn proc_stat_command_with_spaces() {
        let stat = "4242 (my app) S 0 0 0 0 0 0 0 0 0 0 30 20 0 0 20 0 1 0";
        assert_eq!(parse_proc_stat_cpu_ms(stat).unwrap(), 500.0);
    }

    #[test]
    fn proc_stat_short_is_malformed() {
        let err = parse_proc_stat_cpu_ms("4242 (mock) S 0 0").unwrap_err();
        assert!(matches!(err, CoreError::Malformed { .. }));
    }

    #[test]
    fn parsers_are_deterministic() {
        let output = "TOTAL PSS: 4096\n";
        assert_eq!(
            parse_meminfo_mb(output).unwrap(),
            parse_meminfo_mb(output).unwrap()
        );
    }
}
