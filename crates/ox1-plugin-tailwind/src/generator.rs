//! Running the Tailwind CSS CLI over a stylesheet

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

use crate::error::GeneratorError;
use crate::provider::TailwindProvider;

/// Maximum allowed size for CLI output (50 MB)
pub const MAX_OUTPUT_SIZE: usize = 50 * 1024 * 1024;

/// Default timeout for CLI operations (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tailwind CSS CLI generator
///
/// Pipes a stylesheet through the Tailwind CLI (stdin in, stdout out) from
/// the project root, so class candidates are scanned from the project.
#[derive(Debug, Clone)]
pub struct TailwindGenerator {
    provider: TailwindProvider,

    /// Working directory for the CLI
    project_root: PathBuf,

    config_file: Option<PathBuf>,

    minify: bool,

    timeout_secs: u64,
}

impl TailwindGenerator {
    pub fn new(provider: TailwindProvider, project_root: PathBuf) -> Self {
        Self {
            provider,
            project_root,
            config_file: None,
            minify: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the Tailwind config file path
    pub fn with_config(mut self, config_file: Option<PathBuf>) -> Self {
        self.config_file = config_file;
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn provider(&self) -> &TailwindProvider {
        &self.provider
    }

    /// Generate CSS from `input_css`
    ///
    /// Spawns the CLI, writes the input to stdin and reads the generated CSS
    /// from stdout. A run longer than the timeout is killed and reported as
    /// [`GeneratorError::Timeout`].
    pub async fn generate_from_input(&self, input_css: &str) -> Result<String, GeneratorError> {
        let parts = self.provider.command();
        let mut cmd = Command::new(&parts[0]);
        cmd.args(&parts[1..]);

        if let Some(config) = &self.config_file {
            cmd.arg("--config").arg(config);
        }

        if self.minify {
            cmd.arg("--minify");
        }

        // -i - reads from stdin, -o - writes to stdout
        cmd.arg("-i").arg("-").arg("-o").arg("-");

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .current_dir(&self.project_root);

        let mut child = cmd.spawn().map_err(GeneratorError::spawn_failed)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            GeneratorError::spawn_failed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Failed to capture stdin",
            ))
        })?;

        stdin
            .write_all(input_css.as_bytes())
            .await
            .map_err(GeneratorError::spawn_failed)?;
        drop(stdin); // EOF

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| GeneratorError::timeout(self.timeout_secs))?
        .map_err(GeneratorError::spawn_failed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(GeneratorError::cli_exit_error(exit_code, stderr));
        }

        if output.stdout.len() > MAX_OUTPUT_SIZE {
            return Err(GeneratorError::output_too_large(
                output.stdout.len(),
                MAX_OUTPUT_SIZE,
            ));
        }

        String::from_utf8(output.stdout).map_err(GeneratorError::parse_error)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> TailwindProvider {
        let path = dir.path().join("fake-tailwindcss");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        TailwindProvider::LocalBinary(path)
    }

    #[tokio::test]
    async fn pipes_stdin_to_stdout() {
        let dir = TempDir::new().unwrap();
        let generator = TailwindGenerator::new(script(&dir, "cat"), dir.path().to_path_buf());

        let css = generator.generate_from_input(".a { color: red; }").await.unwrap();
        assert_eq!(css, ".a { color: red; }");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let dir = TempDir::new().unwrap();
        let generator = TailwindGenerator::new(
            script(&dir, "cat > /dev/null; echo 'bad input' >&2; exit 3"),
            dir.path().to_path_buf(),
        );

        match generator.generate_from_input("x").await {
            Err(GeneratorError::CliExitError { exit_code, stderr }) => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("bad input"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_cli_times_out() {
        let dir = TempDir::new().unwrap();
        let generator = TailwindGenerator::new(script(&dir, "cat > /dev/null; sleep 5"), dir.path().to_path_buf())
            .with_timeout(1);

        let err = generator.generate_from_input("x").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Timeout { timeout_secs: 1 }));
    }
}
