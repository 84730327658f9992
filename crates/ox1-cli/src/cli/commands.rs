use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server
    ///
    /// Transpiles components on request, processes Tailwind CSS and reloads
    /// connected browsers when project files change.
    Dev(DevArgs),
}

/// Arguments for the dev command.
///
/// Unset options fall back to `ox1.toml`, the `"0x1"` field of
/// `package.json`, `OX1_*` environment variables and then defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct DevArgs {
    /// Port to listen on
    ///
    /// When the port is busy the next ten ports are tried.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Open the browser once the server is listening
    #[arg(long)]
    pub open: bool,

    /// Skip Tailwind CSS processing
    #[arg(long)]
    pub no_tailwind: bool,
}
