//! Tailwind CSS processing for the 0x1 development server.
//!
//! ## Architecture
//!
//! ```text
//! app/globals.css ─► TailwindCache ─► CssProcessor ─► Tailwind CLI (stdin → stdout)
//!                         │
//!                         └─► last good CSS served to readers at all times
//! ```
//!
//! The CLI is found through an ordered provider table ([`ProviderLookup`]):
//! the project-local binary, then the project's package manager.

mod cache;
mod error;
mod generator;
mod processor;
mod provider;
mod stylesheet;

pub use cache::{CacheState, PLACEHOLDER, ProcessedCss, TAILWIND_URL, TailwindCache};
pub use error::{GeneratorError, TailwindError};
pub use generator::{DEFAULT_TIMEOUT_SECS, MAX_OUTPUT_SIZE, TailwindGenerator};
pub use processor::{CssProcessor, TailwindCliProcessor};
pub use provider::{PackageManager, ProviderLookup, TailwindProvider};
pub use stylesheet::{GLOBAL_STYLESHEETS, find_global_stylesheet, url_path};
