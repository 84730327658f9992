//! Command-line interface definition for `ox1`.
//!
//! - `ox1 dev` - development server with live reload

mod commands;

use clap::Parser;

pub use commands::{Command, DevArgs};

/// 0x1 framework CLI.
#[derive(Parser, Debug)]
#[command(
    name = "ox1",
    version,
    about = "Development server for 0x1 applications",
    long_about = "Serves a 0x1 project with on-demand JSX/TSX transpilation,\n\
                  Tailwind CSS processing and live reload over WebSocket or SSE."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
