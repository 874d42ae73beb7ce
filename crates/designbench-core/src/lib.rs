// designbench-core: Launch, parse and report pipeline shared by the CLI.

pub mod android;
pub mod error;
pub mod exec;
pub mod ios;
pub mod preflight;
pub mod project;
pub mod report;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use exec::{Deadline, Invoker, ToolCommand};
pub use report::{AndroidMetrics, DeviceMetadata, IosMetrics, Platform, Report};

/// Shorthand result type for the core crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
