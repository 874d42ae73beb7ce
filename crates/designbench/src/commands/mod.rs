//! Command dispatch: bridges CLI args -> core pipelines -> output formatting.

pub mod android;
pub mod config_cmd;
pub mod devices;
pub mod ios;
pub mod preflight;
pub mod util;

use designbench_core::{Deadline, Invoker};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Everything a tool-driving command needs besides its own arguments.
pub struct Context {
    pub config: Config,
    /// Shared by every tool invocation of the command; the deadline starts now.
    pub invoker: Invoker,
    pub color: bool,
}

impl Context {
    pub fn new(global: &GlobalOpts, config: Config) -> Result<Self, CliError> {
        let budget = config::timeout(global, &config)?;
        let color = output::should_color(config::color_mode(global, &config));
        tracing::debug!(?budget, color, "command context ready");
        Ok(Self {
            config,
            invoker: Invoker::new(Deadline::from_budget(budget)),
            color,
        })
    }
}

/// Dispatch a tool-driving command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Android(args) => android::handle(args, ctx, global).await,
        Command::Ios(args) => ios::handle(args, ctx, global).await,
        Command::Preflight(args) => preflight::handle(args, ctx, global).await,
        Command::Devices(args) => devices::handle(args, ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
