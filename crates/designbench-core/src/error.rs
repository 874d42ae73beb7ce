// ── Core error types ──
//
// Four families matter to callers: required input that was never supplied,
// tool invocations that failed (spawn, non-zero exit, deadline), parse misses
// on otherwise-successful output, and project detection failures. The CLI
// maps each family onto its own exit code.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Required input ───────────────────────────────────────────────
    #[error("{what} is required")]
    MissingInput { what: &'static str },

    // ── Tool invocation ──────────────────────────────────────────────
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {output}")]
    ToolFailed {
        command: String,
        status: String,
        /// Combined stdout + stderr of the failed process.
        output: String,
    },

    #[error("`{command}` did not finish before the {}s deadline", budget.as_secs_f64())]
    Timeout { command: String, budget: Duration },

    // ── Parse misses ─────────────────────────────────────────────────
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("no booted simulator found")]
    NoBootedSimulator,

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    // ── Project detection ────────────────────────────────────────────
    #[error("{kind} not found under {}", root.display())]
    ProjectNotFound { kind: &'static str, root: PathBuf },

    #[error("package attribute not found in {}", path.display())]
    ManifestPackageMissing { path: PathBuf },

    #[error("CFBundleIdentifier not found in {}", path.display())]
    BundleIdMissing { path: PathBuf },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Returns `true` if the shared deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for parse misses (expected marker absent from output).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoBootedSimulator)
    }
}

/// Convert a best-effort diagnostic result into an optional value.
///
/// Any failure leaves the field unset except a timeout, which aborts the
/// whole collection.
pub(crate) fn optional<T>(what: &str, result: Result<T, CoreError>) -> Result<Option<T>, CoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_timeout() => Err(err),
        Err(err) => {
            tracing::debug!(diagnostic = what, error = %err, "diagnostic unavailable");
            Ok(None)
        }
    }
}
