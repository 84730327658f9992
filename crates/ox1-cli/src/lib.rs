//! 0x1 CLI - development server for the 0x1 framework.
//!
//! Wires the workspace crates into `ox1 dev`:
//!
//! - [`dev::watcher`] turns file system events into reload events
//! - [`dev::broadcaster`] fans them out to WebSocket and SSE clients
//! - [`dev::server`] answers HTTP requests from the transpiler, the Tailwind
//!   cache and the project's static files
//!
//! # Example
//!
//! ```rust,no_run
//! use ox1_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
