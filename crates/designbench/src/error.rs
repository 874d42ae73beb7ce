//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use designbench_config::ConfigError;
use designbench_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const TOOL: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Usage ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(designbench::validation))]
    Validation { field: String, reason: String },

    #[error("Missing {platform} {flags}")]
    #[diagnostic(
        code(designbench::missing_input),
        help("Run from the project root or provide {flags} explicitly.")
    )]
    MissingInput { platform: &'static str, flags: String },

    #[error("Unable to auto-detect {what}")]
    #[diagnostic(
        code(designbench::detection_failed),
        help("Set {flags} manually, or point --project-root at the project.")
    )]
    DetectionFailed {
        what: &'static str,
        flags: &'static str,
        #[source]
        source: Box<CoreError>,
    },

    // ── External tools ───────────────────────────────────────────────
    #[error("Could not run `{program}`")]
    #[diagnostic(
        code(designbench::tool_unavailable),
        help("Install it or pass its location (--adb-path / --xcrun-path).\nTry: designbench preflight")
    )]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status})")]
    #[diagnostic(code(designbench::tool_failed), help("Tool output:\n{output}"))]
    ToolFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("`{command}` did not finish within {seconds}s")]
    #[diagnostic(
        code(designbench::timeout),
        help("Raise the deadline with --timeout (e.g. --timeout 2m), or 0 to disable it.")
    )]
    Timeout { command: String, seconds: f64 },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("No booted simulator found")]
    #[diagnostic(
        code(designbench::no_simulator),
        help("Boot one with: xcrun simctl boot <udid>\nOr pass --device explicitly.")
    )]
    NoBootedSimulator,

    #[error("{what} not found")]
    #[diagnostic(code(designbench::not_found))]
    NotFound { what: String },

    // ── Everything else from core ────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(designbench::core))]
    Core(Box<CoreError>),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(designbench::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(designbench::config),
        help("Check the config file (designbench config path) and DESIGNBENCH_* variables.")
    )]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    #[diagnostic(code(designbench::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::MissingInput { .. } | Self::DetectionFailed { .. } => {
                exit_code::USAGE
            }
            Self::ToolUnavailable { .. } | Self::ToolFailed { .. } => exit_code::TOOL,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NoBootedSimulator | Self::NotFound { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingInput { what } => CliError::Validation {
                field: "input".into(),
                reason: format!("{what} is required"),
            },

            CoreError::Spawn { program, source } => CliError::ToolUnavailable { program, source },

            CoreError::ToolFailed {
                command,
                status,
                output,
            } => CliError::ToolFailed {
                command,
                status,
                output,
            },

            CoreError::Timeout { command, budget } => CliError::Timeout {
                command,
                seconds: budget.as_secs_f64(),
            },

            CoreError::NoBootedSimulator => CliError::NoBootedSimulator,

            CoreError::NotFound { what } => CliError::NotFound { what },

            other => CliError::Core(Box::new(other)),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::AlreadyExists { path } => CliError::ConfigExists {
                path: path.display().to_string(),
            },
            ConfigError::Io(err) => CliError::Io(err),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::MissingInput {
                    what: "ios bundle id",
                },
                exit_code::USAGE,
            ),
            (
                CoreError::ToolFailed {
                    command: "adb shell am start -W x/.Main".into(),
                    status: "exit status: 1".into(),
                    output: "Error".into(),
                },
                exit_code::TOOL,
            ),
            (
                CoreError::Spawn {
                    program: "adb".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                },
                exit_code::TOOL,
            ),
            (
                CoreError::Timeout {
                    command: "adb shell top".into(),
                    budget: Duration::from_secs(60),
                },
                exit_code::TIMEOUT,
            ),
            (CoreError::NoBootedSimulator, exit_code::NOT_FOUND),
            (
                CoreError::NotFound {
                    what: "TOTAL line in meminfo".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Malformed {
                    what: "proc stat",
                    reason: "too few fields".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (core, code) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), code, "{label}");
        }
    }

    #[test]
    fn existing_config_is_its_own_error() {
        let err = CliError::from(ConfigError::AlreadyExists {
            path: "/tmp/config.toml".into(),
        });
        assert!(matches!(err, CliError::ConfigExists { ref path } if path == "/tmp/config.toml"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
