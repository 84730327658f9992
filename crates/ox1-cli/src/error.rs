//! Error handling for the `ox1` CLI.
//!
//! Library errors convert into [`CliError`] through `#[from]`; `main` turns the
//! final error into a `miette` report.
//!
//! # Example
//!
//! ```rust,no_run
//! use ox1_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_index(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Create public/index.html or remove the file reference")
//! }
//! ```

mod report;

use std::path::PathBuf;

use ox1_config::ConfigError;
use ox1_plugin_tailwind::TailwindError;
use thiserror::Error;

pub use report::cli_error_to_miette;

/// Top-level CLI error.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tailwind(#[from] TailwindError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server failed to bind or crashed
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Result type alias for CLI operations.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for attaching context to errors.
pub trait ResultExt<T> {
    /// Turn a `NotFound` I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_from_config_error() {
        let config_err = ConfigError::RootNotFound(PathBuf::from("/missing"));
        let cli_err: CliError = config_err.into();
        assert!(matches!(cli_err, CliError::Config(_)));
        assert!(cli_err.to_string().contains("/missing"));
    }

    #[test]
    fn test_cli_error_from_tailwind_error() {
        let err: CliError = TailwindError::NoStylesheet {
            root: PathBuf::from("/project"),
        }
        .into();
        assert!(matches!(err, CliError::Tailwind(_)));
        assert!(err.to_string().contains("No global stylesheet"));
    }

    #[test]
    fn test_result_ext_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let err = result.with_path("/test/index.html").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_result_ext_with_path_keeps_other_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let err = result.with_path("/test/index.html").unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_result_ext_with_hint() {
        let result: std::result::Result<(), ConfigError> =
            Err(ConfigError::invalid("dev.port", "Port must be between 1 and 65535"));

        let err = result.with_hint("Pass --port").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dev.port"));
        assert!(msg.contains("Hint: Pass --port"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: std::result::Result<(), CliError> =
            Err(CliError::Server("address in use".into()));

        let err = result.context("Failed to start").unwrap_err();
        assert_eq!(err.to_string(), "Failed to start: Server error: address in use");
    }
}
