//! Logging setup for the `ox1` CLI.
//!
//! Built on `tracing` with an `EnvFilter`:
//!
//! - `--verbose` logs debug output from every ox1 crate
//! - `--quiet` keeps errors only
//! - otherwise `RUST_LOG` decides, falling back to info
//!
//! # Example
//!
//! ```rust,no_run
//! use ox1_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("dev server starting");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: &[&str] = &[
    "ox1",
    "ox1_cli",
    "ox1_config",
    "ox1_transpile",
    "ox1_plugin_tailwind",
    "ox1_hooks",
];

/// Initialize the global tracing subscriber.
///
/// Must be called once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = match level_override(verbose, quiet) {
        Some(level) => EnvFilter::new(directives(level)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info"))),
    };

    init_logger_with_filter(filter, no_color);
}

/// Initialize the subscriber with a caller-supplied filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Check if colored output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; without either, the terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}

fn level_override(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some("debug")
    } else if quiet {
        Some("error")
    } else {
        None
    }
}

/// Filter directives applying `level` to every ox1 crate.
fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_directives_cover_all_crates() {
        let d = directives("debug");
        assert!(d.starts_with("ox1=debug,"));
        assert!(d.contains("ox1_transpile=debug"));
        assert!(d.contains("ox1_plugin_tailwind=debug"));
        let _filter = EnvFilter::new(d);
    }

    #[test]
    fn test_verbose_beats_quiet() {
        assert_eq!(level_override(true, true), Some("debug"));
        assert_eq!(level_override(false, true), Some("error"));
        assert_eq!(level_override(false, false), None);
    }

    #[test]
    #[serial]
    fn test_should_use_colors_respects_force_color() {
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(should_use_colors());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    #[serial]
    fn test_no_color_overrides_force_color() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }
}
