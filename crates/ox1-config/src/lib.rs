//! Configuration for the 0x1 development server.
//!
//! Settings are layered with `figment`: built-in defaults, then the project
//! config file (`ox1.toml` or the `"0x1"` field of `package.json`), then
//! `OX1_` environment variables, then command-line overrides.

pub mod config;
pub mod discovery;
pub mod error;
pub mod validation;

pub use config::*;
pub use discovery::{ConfigDiscovery, ConfigSource};
pub use error::*;
