//! Storefront E2E CLI library
//!
//! Command-line driver for the storefront page objects: launches the
//! browser, gives every scenario its own isolated page and reports results.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, FormatArg, RunArgs, ScenarioArg};
pub use config::{load_env_file, CliConfig, ColorChoice, Verbosity, DEFAULT_ENV_FILE};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
#[cfg(feature = "browser")]
pub use runner::ChromiumSource;
pub use runner::{MockSource, PageSource, RunSummary, ScenarioResult, ScenarioRunner};
