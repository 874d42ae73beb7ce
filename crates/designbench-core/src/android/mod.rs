//! Android launch benchmarking over `adb`.

pub mod parse;
mod runner;

pub use runner::{COMPONENT_EXTRA, Config, component_arg, default_install_task, install, run};
