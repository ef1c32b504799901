//! Command-line interface for ratemeter
//!
//! The `ratemeter` binary drives a [`GuiMeter`](crate::GuiMeter) through a simulated run so
//! the meter's behavior can be observed without a real windowing toolkit.
//!
//! ## Commands
//!
//! - **simulate**: Run a meter over headless plot or widget backends and print one JSON
//!   snapshot per rendered frame
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. The `common` module holds the pieces shared by the
//! handlers, such as logging setup.

mod common;
mod host;
mod init;
mod run;
mod simulate;
mod validate;

pub use common::{LogLevel, SurfaceArg};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use simulate::{SimulateArgs, simulate};
pub use validate::{ValidateArgs, validate_config};

#[cfg(test)]
pub use host::TestHost;
