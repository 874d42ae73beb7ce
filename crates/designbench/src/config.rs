//! Command-line flags layered over the loaded configuration.

use std::time::Duration;

use clap::ValueEnum;

pub use designbench_config::{Config, config_path, init_config, load_config};

use crate::cli::{ColorMode, GlobalOpts};
use crate::error::CliError;

/// Load the config, falling back to defaults when it cannot be read.
pub fn load() -> Config {
    load_config().unwrap_or_else(|err| {
        tracing::warn!(path = %config_path().display(), error = %err, "ignoring unreadable config");
        Config::default()
    })
}

/// `--timeout`, else `defaults.timeout`. `None` means no deadline.
pub fn timeout(global: &GlobalOpts, cfg: &Config) -> Result<Option<Duration>, CliError> {
    parse_timeout(global.timeout.as_deref().unwrap_or(&cfg.defaults.timeout))
}

/// Parse a humantime duration; empty and zero disable the deadline.
pub fn parse_timeout(raw: &str) -> Result<Option<Duration>, CliError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" {
        return Ok(None);
    }
    let budget = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: "timeout".into(),
        reason: format!("{raw:?}: {e}"),
    })?;
    Ok(Some(budget).filter(|d| !d.is_zero()))
}

/// `--color`, else `defaults.color`; unrecognised config values mean auto.
pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| {
        ColorMode::from_str(cfg.defaults.color.trim(), true).unwrap_or_else(|_| {
            tracing::warn!(value = %cfg.defaults.color, "unknown color mode in config, using auto");
            ColorMode::Auto
        })
    })
}

/// A flag value, else the configured one.
pub fn pick(flag: Option<String>, configured: &str) -> String {
    flag.filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| configured.to_owned())
}
