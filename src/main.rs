use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use tagcount::command::Commands;
use tagcount::runtime::{setup_global_logger, LogLevel};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// trace, debug, info, warn or error. RUST_LOG takes precedence
    #[arg(long = "log-level", global = true)]
    log_level: Option<LogLevel>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_global_logger(cli.log_level);
    info!("Running command {:?}", cli.command);

    let result = match cli.command {
        Commands::Count(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
