//! Clap derive structures for the `designbench` CLI.
//!
//! Also compiled into `build.rs` for man page generation, so nothing here may
//! reference other crate modules.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// designbench -- launch-time benchmarks for mobile UI screens
#[derive(Debug, Parser)]
#[command(
    name = "designbench",
    version,
    about = "Benchmark mobile UI screen launch on Android and iOS",
    long_about = "Launches a screen through adb or xcrun simctl, times its startup,\n\
        collects memory and CPU figures from the platform diagnostics and\n\
        writes a JSON report plus a short terminal summary.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Component label recorded in the report
    #[arg(long, global = true)]
    pub component: Option<String>,

    /// View identifier forwarded to the benchmark harness on the device
    #[arg(long, global = true)]
    pub view: Option<String>,

    /// Report path; relative paths resolve under the reports directory
    #[arg(long, short = 'o', global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overall command deadline (e.g. 45s, 2m); 0 disables it
    #[arg(long, global = true, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Stdout format
    #[arg(
        long,
        short = 'f',
        env = "DESIGNBENCH_FORMAT",
        default_value = "table",
        global = true
    )]
    pub format: OutputFormat,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human summary or table (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one record per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal and NO_COLOR is unset
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the Android launch benchmark through adb
    #[command(alias = "a")]
    Android(AndroidArgs),

    /// Run the iOS launch benchmark through xcrun simctl
    #[command(alias = "i")]
    Ios(IosArgs),

    /// Check tools, projects and devices before benchmarking
    Preflight(PreflightArgs),

    /// List attached Android devices and iOS simulators
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Android ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AndroidArgs {
    /// Application package (detected from AndroidManifest.xml when omitted)
    #[arg(long)]
    pub package: Option<String>,

    /// Activity to launch, e.g. `.MainActivity` (detected when omitted)
    #[arg(long)]
    pub activity: Option<String>,

    /// adb device serial (`adb -s`)
    #[arg(long, env = "ANDROID_SERIAL")]
    pub device: Option<String>,

    /// Path to the adb binary
    #[arg(long, value_name = "PATH")]
    pub adb_path: Option<String>,

    /// Run the Gradle install task before benchmarking
    #[arg(long)]
    pub install: bool,

    /// Path to the Gradle wrapper used by --install
    #[arg(long, value_name = "PATH")]
    pub gradle_path: Option<String>,

    /// Gradle task run by --install (default :<module>:installRelease)
    #[arg(long, value_name = "TASK")]
    pub install_task: Option<String>,

    /// Project root used for detection and Gradle (default: current dir)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Extra arguments appended to `am start`
    #[arg(last = true, value_name = "ARGS")]
    pub launch_args: Vec<String>,
}

// ── iOS ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IosArgs {
    /// Bundle identifier (detected from Info.plist when omitted)
    #[arg(long, value_name = "ID")]
    pub bundle: Option<String>,

    /// Simulator UDID (default: first booted simulator)
    #[arg(long)]
    pub device: Option<String>,

    /// Path to the xcrun binary
    #[arg(long, value_name = "PATH")]
    pub xcrun_path: Option<String>,

    /// Project root used for detection (default: current dir)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Extra arguments passed to the launched app
    #[arg(last = true, value_name = "ARGS")]
    pub launch_args: Vec<String>,
}

// ── Preflight ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PreflightArgs {
    /// Directory searched for the Android and iOS projects
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Path to the adb binary
    #[arg(long, value_name = "PATH")]
    pub adb_path: Option<String>,

    /// Path to the xcrun binary
    #[arg(long, value_name = "PATH")]
    pub xcrun_path: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Which platform to list
    #[arg(long, short = 'p', default_value = "all")]
    pub platform: PlatformFilter,

    /// Path to the adb binary
    #[arg(long, value_name = "PATH")]
    pub adb_path: Option<String>,

    /// Path to the xcrun binary
    #[arg(long, value_name = "PATH")]
    pub xcrun_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformFilter {
    Android,
    Ios,
    All,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
