//! osc - command-line client for the object storage service

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use commands::Commands;
use exit_code::ExitCode;
use output::OutputConfig;

/// Command-line client for the object storage service
#[derive(Parser, Debug)]
#[command(name = "osc", version, about, propagate_version = true)]
pub struct Cli {
    /// Print strict JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log requests and retries to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = tokio::select! {
        code = commands::execute(cli.command, output_config) => code,
        _ = tokio::signal::ctrl_c() => {
            output::Formatter::new(output_config).error("Interrupted");
            ExitCode::Interrupted
        }
    };

    code.into()
}
