//! Command dispatch logic for ratemeter

use super::{InitArgs, SimulateArgs, ValidateArgs, init_config, simulate, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "ratemeter", author, version, long_about = None)]
#[command(about = "Watch a GUI progress meter track a simulated run")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive a meter over headless surfaces and print its frames as JSON lines
    Simulate(Box<SimulateArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Simulate(simulate_args) => simulate(host, simulate_args).await,
        Command::Init(init_args) => init_config(host, init_args),
        Command::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::TestHost;

    #[tokio::test]
    async fn test_simulate_missing_config_fails() {
        let mut host = TestHost::new();
        run(
            &mut host,
            [
                "ratemeter",
                "simulate",
                "--surface",
                "widget",
                "--total",
                "4",
                "--steps",
                "4",
                "--step-delay",
                "1s",
                "--virtual-time",
                "--config",
                "does-not-exist.toml",
            ],
        )
        .await
        .unwrap_err();

        assert!(host.output_text().is_empty());
    }

    #[tokio::test]
    async fn test_init_then_validate() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("meter.toml");
        let path = path.to_string_lossy().to_string();

        let mut host = TestHost::new();
        run(&mut host, ["ratemeter", "init", path.as_str()]).await.unwrap();
        run(&mut host, ["ratemeter", "validate", "--config", path.as_str()]).await.unwrap();

        assert!(host.output_text().contains("Configuration file is valid"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
