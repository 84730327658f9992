//! Status message functions for terminal output.

use owo_colors::{OwoColorize, Stream, Style};

use super::is_quiet;

fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stderr, |t| t.style(style))
        .to_string()
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    let style = Style::new().yellow();
    eprintln!("{} {}", paint("⚠", style.bold()), paint(message, style));
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    let style = Style::new().red();
    eprintln!("{} {}", paint("✗", style.bold()), paint(message, style));
}

/// Print a debug message to stderr (only if RUST_LOG is set).
pub fn debug(message: &str) {
    if is_quiet() || std::env::var("RUST_LOG").is_err() {
        return;
    }
    let dim = Style::new().dimmed();
    eprintln!("{} {}", paint("◆", dim), paint(message, dim));
}

/// Announce a listening server and the endpoints browsers connect to.
pub fn server_ready(url: &str, live_reload: &[&str]) {
    let dim = Style::new().dimmed();
    eprintln!();
    eprintln!(
        "  {} {}",
        paint("0x1 dev", Style::new().cyan().bold()),
        paint("ready", Style::new().green())
    );
    eprintln!();
    eprintln!(
        "  {} {}",
        paint("➜ Local:", Style::new().bold()),
        paint(url, Style::new().cyan().underline())
    );
    for endpoint in live_reload {
        eprintln!("  {} {}{}", paint("➜ Reload:", dim), paint(url, dim), paint(endpoint, dim));
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        success("Success message");
        info("Info message");
        warning("Warning message");
        error("Error message");
        debug("Debug message");
        server_ready("http://127.0.0.1:3000", &["/__0x1_ws_live_reload"]);
    }
}
