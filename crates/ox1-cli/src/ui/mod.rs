//! Terminal output for the `ox1` CLI.
//!
//! Status lines go to stderr so they never mix with piped output.
//!
//! ```no_run
//! use ox1_cli::ui;
//!
//! ui::init(false, false);
//! ui::success("Development server running at http://127.0.0.1:3000");
//! ui::warning("Port 3000 is busy, using port 3001 instead");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

mod messages;

pub use messages::{debug, error, info, server_ready, success, warning};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Apply `--quiet` and `--no-color` to every status line.
///
/// Quiet mode keeps warnings, errors and the server banner.
pub fn init(quiet: bool, no_color: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    owo_colors::set_override(!no_color && crate::logger::should_use_colors());
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}
