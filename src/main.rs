//! qcscan - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qcscan::cli::{Cli, Commands, ConfigCommands};

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(not(tarpaulin_include))]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify {
            input,
            output,
            missing_output,
            run,
        } => commands::classify::handle(
            cli.config.as_deref(),
            &input,
            &output,
            missing_output.as_deref(),
            &run,
        ),
        Commands::Extract {
            input,
            output,
            include_crypt,
            delimiter,
            run,
        } => commands::extract::handle(
            cli.config.as_deref(),
            &input,
            &output,
            include_crypt,
            delimiter.as_deref(),
            &run,
        ),
        Commands::Worker { settings } => commands::worker::handle(&settings),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(cli.config.as_deref()),
        },
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}
