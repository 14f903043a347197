use std::process::ExitCode;

use clap::Parser;
use indrop::command::process_barcodes::expand_short_flags;
use indrop::runtime::Commands;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(expand_short_flags(std::env::args_os()));

    let result = match cli.command {
        Commands::ProcessBarcodes(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
