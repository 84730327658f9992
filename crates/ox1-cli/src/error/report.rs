//! Conversion of CLI errors into `miette` reports.

use miette::Report;

use crate::error::CliError;

/// Convert a [`CliError`] into a report, keeping diagnostic codes and help
/// text where the source error carries them.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Tailwind(e) => Report::new(e),
        CliError::Config(e) => miette::miette!(
            help = "Check ox1.toml, the \"0x1\" field of package.json and OX1_* variables",
            "Configuration error: {}",
            e
        ),
        CliError::Server(msg) => miette::miette!(
            help = "Another process may be using the port; try --port",
            "Server error: {}",
            msg
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ox1_plugin_tailwind::TailwindError;
    use std::path::PathBuf;

    #[test]
    fn tailwind_errors_keep_their_code() {
        let report = cli_error_to_miette(CliError::Tailwind(TailwindError::NoStylesheet {
            root: PathBuf::from("/project"),
        }));
        let code = report.code().map(|c| c.to_string());
        assert!(code.is_some_and(|c| c.starts_with("ox1::tailwind")));
    }

    #[test]
    fn other_errors_keep_their_message() {
        let report = cli_error_to_miette(CliError::InvalidArgument("--port".into()));
        assert!(report.to_string().contains("--port"));
    }
}
