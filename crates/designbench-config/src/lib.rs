//! Configuration for the designbench CLI.
//!
//! Built-in defaults, then `config.toml`, then `DESIGNBENCH_*` environment
//! variables (nested keys split on `__`, e.g. `DESIGNBENCH_ANDROID__ADB_PATH`).
//! Command-line flags override all of these in the binary.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "DESIGNBENCH_CONFIG";

const ENV_PREFIX: &str = "DESIGNBENCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("config file already exists at {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub android: AndroidDefaults,

    #[serde(default)]
    pub ios: IosDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Overall command deadline, humantime syntax (`45s`, `2m`); `0` disables.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Directory that relative and default report paths resolve under.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// `auto`, `always` or `never`.
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            reports_dir: default_reports_dir(),
            color: default_color(),
        }
    }
}

fn default_timeout() -> String {
    "60s".into()
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("designbench-reports")
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AndroidDefaults {
    #[serde(default = "default_adb_path")]
    pub adb_path: String,

    #[serde(default = "default_gradle_path")]
    pub gradle_path: String,

    /// Gradle task run by `--install`; derived from the project when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_task: Option<String>,
}

impl Default for AndroidDefaults {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            gradle_path: default_gradle_path(),
            install_task: None,
        }
    }
}

fn default_adb_path() -> String {
    "adb".into()
}
fn default_gradle_path() -> String {
    "./gradlew".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IosDefaults {
    #[serde(default = "default_xcrun_path")]
    pub xcrun_path: String,
}

impl Default for IosDefaults {
    fn default() -> Self {
        Self {
            xcrun_path: default_xcrun_path(),
        }
    }
}

fn default_xcrun_path() -> String {
    "xcrun".into()
}

impl Config {
    /// Pretty TOML, as written by [`init_config`].
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `DESIGNBENCH_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("dev", "designbench", "designbench").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("designbench");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered figment for the file at `path` plus the environment.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment_for(path).extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Write a default config to `path`. Refuses to overwrite unless `force`.
pub fn init_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_config_to(path, &Config::default())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml()?)?;
    Ok(())
}
