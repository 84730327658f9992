//! `ox1` - development server for 0x1 applications.
//!
//! Parses arguments, sets up logging and dispatches to the command.

use clap::Parser;
use miette::Result;
use ox1_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init(args.quiet, args.no_color);

    let result = match args.command {
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
