// ── Process invoker ──
//
// Every diagnostic is one external process. `Invoker` runs them one at a
// time under a single shared `Deadline`: the budget covers the whole
// top-level command, so a slow early probe eats into the time left for
// later ones. When the deadline fires the in-flight child is killed.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::Instant;

use crate::error::CoreError;

// ── Deadline ────────────────────────────────────────────────────────

/// Wall-clock bound shared by every process spawned for one command.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now. A budget past the clock's range is
    /// no deadline at all.
    pub fn after(budget: Duration) -> Self {
        match Instant::now().checked_add(budget) {
            Some(at) => Self {
                at: Some(at),
                budget,
            },
            None => Self::none(),
        }
    }

    /// No deadline at all.
    pub fn none() -> Self {
        Self {
            at: None,
            budget: Duration::ZERO,
        }
    }

    /// `None` or a zero budget disables the deadline.
    pub fn from_budget(budget: Option<Duration>) -> Self {
        match budget {
            Some(budget) if !budget.is_zero() => Self::after(budget),
            _ => Self::none(),
        }
    }

    /// The total budget this deadline was created with.
    pub fn budget(&self) -> Option<Duration> {
        self.at.map(|_| self.budget)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

// ── Command description ─────────────────────────────────────────────

/// An external tool invocation: program, arguments and extra environment.
///
/// `Display` renders the literal command line recorded in reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` when a target is given (e.g. `-s <serial>`).
    pub fn selector(self, flag: &str, target: Option<&str>) -> Self {
        match target.map(str::trim).filter(|t| !t.is_empty()) {
            Some(target) => self.arg(flag).arg(target),
            None => self,
        }
    }

    /// Inject an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> &[(String, String)] {
        &self.envs
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(ref dir) = self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── Captured output ─────────────────────────────────────────────────

/// Output of a process that exited successfully.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stdout followed by stderr, lossily decoded.
    pub fn combined(&self) -> String {
        combine(&self.stdout, &self.stderr)
    }
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(stderr));
    text
}

// ── Invoker ─────────────────────────────────────────────────────────

/// Runs tool commands sequentially under one shared deadline. No retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invoker {
    deadline: Deadline,
}

impl Invoker {
    pub fn new(deadline: Deadline) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Run to completion, capturing stdout and stderr separately.
    ///
    /// Non-zero exit becomes [`CoreError::ToolFailed`] carrying the combined
    /// output; deadline expiry kills the child and yields
    /// [`CoreError::Timeout`].
    pub async fn output(&self, cmd: &ToolCommand) -> Result<CapturedOutput, CoreError> {
        tracing::debug!(command = %cmd, "running tool");
        let child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CoreError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        let output = self.bounded(cmd, child.wait_with_output()).await??;
        if !output.status.success() {
            return Err(CoreError::ToolFailed {
                command: cmd.to_string(),
                status: output.status.to_string(),
                output: combine(&output.stdout, &output.stderr),
            });
        }
        Ok(CapturedOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run and return stdout + stderr as one string.
    pub async fn combined(&self, cmd: &ToolCommand) -> Result<String, CoreError> {
        Ok(self.output(cmd).await?.combined())
    }

    /// Run with output streamed to the terminal (long-running build steps).
    ///
    /// The child's stdout is sent to our stderr so that machine-readable
    /// output on stdout stays clean.
    pub async fn status(&self, cmd: &ToolCommand) -> Result<(), CoreError> {
        tracing::debug!(command = %cmd, "running tool with inherited stderr");
        let mut child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CoreError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        let status = self.bounded(cmd, child.wait()).await??;
        if !status.success() {
            return Err(CoreError::ToolFailed {
                command: cmd.to_string(),
                status: status.to_string(),
                output: String::new(),
            });
        }
        Ok(())
    }

    async fn bounded<F: Future>(&self, cmd: &ToolCommand, fut: F) -> Result<F::Output, CoreError> {
        match self.deadline.at {
            None => Ok(fut.await),
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .map_err(|_| CoreError::Timeout {
                    command: cmd.to_string(),
                    budget: self.deadline.budget,
                }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_literal_command_line() {
        let cmd = ToolCommand::new("adb")
            .selector("-s", Some("emulator-5554"))
            .args(["shell", "am", "start", "-W", "com.example/.MainActivity"]);
        assert_eq!(
            cmd.to_string(),
            "adb -s emulator-5554 shell am start -W com.example/.MainActivity"
        );
    }

    #[test]
    fn selector_skips_empty_target() {
        let cmd = ToolCommand::new("adb").selector("-s", Some("  ")).arg("devices");
        assert_eq!(cmd.get_args(), ["devices"]);
        let cmd = ToolCommand::new("adb").selector("-s", None).arg("devices");
        assert_eq!(cmd.to_string(), "adb devices");
    }

    #[test]
    fn env_is_not_part_of_display() {
        let cmd = ToolCommand::new("xcrun")
            .args(["simctl", "launch", "booted", "com.example"])
            .env("SIMCTL_CHILD_DESIGNBENCH_COMPONENT", "Card");
        assert_eq!(cmd.to_string(), "xcrun simctl launch booted com.example");
        assert_eq!(cmd.get_envs().len(), 1);
    }

    #[test]
    fn zero_budget_disables_deadline() {
        assert!(Deadline::from_budget(Some(Duration::ZERO)).budget().is_none());
        assert!(Deadline::from_budget(None).budget().is_none());
        let deadline = Deadline::from_budget(Some(Duration::from_secs(30)));
        assert_eq!(deadline.budget(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn unrepresentable_budget_disables_deadline() {
        // 500 billion years
        let huge = Duration::from_secs(500_000_000_000 * 31_557_600);
        assert!(Deadline::after(huge).budget().is_none());
        assert!(Deadline::from_budget(Some(Duration::MAX)).budget().is_none());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let invoker = Invoker::default();
        let err = invoker
            .output(&ToolCommand::new("designbench-no-such-tool-7f3a"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Spawn { .. }), "got {err:?}");
    }
}
