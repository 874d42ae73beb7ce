//! iOS simulator launch benchmarking over `xcrun simctl`.

pub mod parse;
mod runner;

pub use parse::{SimDevice, SimulatorList};
pub use runner::{COMPONENT_ENV, Config, list_simulators, resolve_device, run};
