//! Locating the Tailwind CLI.
//!
//! Providers are tried in a fixed order: the project-local binary first, then
//! the project's package manager. The outcome is a [`ProviderLookup`] rather
//! than an error so callers can decide whether to install.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::time::{Duration, timeout};

use crate::error::GeneratorError;

/// Upper bound on a `tailwindcss` install
const INSTALL_TIMEOUT_SECS: u64 = 180;

/// Supported package managers for running Tailwind CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Npm,
    Bun,
    Deno,
}

impl PackageManager {
    /// Parse a configured package manager name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pnpm" => Some(Self::Pnpm),
            "npm" => Some(Self::Npm),
            "bun" => Some(Self::Bun),
            "deno" => Some(Self::Deno),
            _ => None,
        }
    }

    /// Detect package manager from package.json and lockfiles
    ///
    /// Priority: packageManager field > lockfiles > npm when package.json exists
    pub fn detect(project_root: &Path) -> Option<Self> {
        let package_json_path = project_root.join("package.json");

        // Corepack `packageManager` field
        let declared = std::fs::read_to_string(&package_json_path)
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
            .and_then(|parsed| parsed.get("packageManager")?.as_str().map(str::to_owned));
        if let Some(pm) = declared {
            if pm.starts_with("pnpm") {
                return Some(Self::Pnpm);
            } else if pm.starts_with("bun") {
                return Some(Self::Bun);
            } else if pm.starts_with("npm") {
                return Some(Self::Npm);
            }
        }

        const LOCKFILES: &[(&str, PackageManager)] = &[
            ("pnpm-lock.yaml", PackageManager::Pnpm),
            ("bun.lockb", PackageManager::Bun),
            ("bun.lock", PackageManager::Bun),
            ("deno.lock", PackageManager::Deno),
            ("package-lock.json", PackageManager::Npm),
        ];
        if let Some((_, pm)) = LOCKFILES
            .iter()
            .find(|(file, _)| project_root.join(file).exists())
        {
            return Some(*pm);
        }

        package_json_path.exists().then_some(Self::Npm)
    }

    /// Command that runs the Tailwind CLI through this package manager
    /// (the v4 CLI ships in `@tailwindcss/cli`, binary `tailwindcss`)
    pub fn build_command(&self) -> Vec<&'static str> {
        match self {
            Self::Pnpm => vec!["pnpm", "exec", "tailwindcss"],
            Self::Npm => vec!["npx", "--no-install", "tailwindcss"],
            Self::Bun => vec!["bunx", "tailwindcss"],
            Self::Deno => vec!["deno", "run", "--allow-all", "npm:@tailwindcss/cli"],
        }
    }

    /// Command that adds Tailwind to the project's dev dependencies
    pub fn install_command(&self) -> Vec<&'static str> {
        match self {
            Self::Pnpm => vec!["pnpm", "add", "-D", "tailwindcss", "@tailwindcss/cli"],
            Self::Npm => vec!["npm", "install", "--save-dev", "tailwindcss", "@tailwindcss/cli"],
            Self::Bun => vec!["bun", "add", "-d", "tailwindcss", "@tailwindcss/cli"],
            Self::Deno => vec!["deno", "add", "npm:tailwindcss", "npm:@tailwindcss/cli"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Npm => "npm",
            Self::Bun => "bun",
            Self::Deno => "deno",
        }
    }

    fn binary_name(&self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Npm => "npx",
            Self::Bun => "bunx",
            Self::Deno => "deno",
        }
    }

    /// Check if this package manager binary is available on the system
    pub async fn validate_binary(&self) -> Result<(), GeneratorError> {
        let binary_name = self.binary_name();

        #[cfg(unix)]
        let check_cmd = "which";
        #[cfg(windows)]
        let check_cmd = "where";

        let status = Command::new(check_cmd)
            .arg(binary_name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(GeneratorError::spawn_failed)?;

        if !status.success() {
            return Err(GeneratorError::PackageManagerNotFound {
                package_manager: self.name().to_string(),
                binary_name: binary_name.to_string(),
            });
        }

        Ok(())
    }

    /// Install Tailwind into the project with this package manager.
    pub async fn install_tailwind(&self, project_root: &Path) -> Result<(), GeneratorError> {
        let parts = self.install_command();
        tracing::info!(package_manager = self.name(), "installing tailwindcss");

        let child = Command::new(parts[0])
            .args(&parts[1..])
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(GeneratorError::spawn_failed)?;

        let output = timeout(
            Duration::from_secs(INSTALL_TIMEOUT_SECS),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| GeneratorError::timeout(INSTALL_TIMEOUT_SECS))?
        .map_err(GeneratorError::spawn_failed)?;

        if !output.status.success() {
            return Err(GeneratorError::InstallFailed {
                package_manager: self.name().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

/// A way to run the Tailwind CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailwindProvider {
    /// `node_modules/.bin/tailwindcss`
    LocalBinary(PathBuf),
    PackageManager(PackageManager),
}

impl TailwindProvider {
    pub fn command(&self) -> Vec<String> {
        match self {
            Self::LocalBinary(path) => vec![path.to_string_lossy().into_owned()],
            Self::PackageManager(pm) => pm.build_command().into_iter().map(String::from).collect(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::LocalBinary(path) => path.display().to_string(),
            Self::PackageManager(pm) => format!("{} ({})", pm.name(), pm.build_command().join(" ")),
        }
    }
}

/// Outcome of looking for the Tailwind CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderLookup {
    Found(TailwindProvider),

    /// A package manager is configured but its binary is not on PATH
    PackageManagerMissing(PackageManager),

    /// Tailwind is not installed; `package_manager` could install it
    NotInstalled {
        package_manager: Option<PackageManager>,
        searched: Vec<PathBuf>,
    },
}

impl ProviderLookup {
    /// Look up the Tailwind CLI for `project_root`.
    ///
    /// `preferred` overrides package manager detection.
    pub async fn run(project_root: &Path, preferred: Option<PackageManager>) -> Self {
        let local = local_binary(project_root);
        if local.is_file() {
            return Self::Found(TailwindProvider::LocalBinary(local));
        }

        let package_manager = preferred.or_else(|| PackageManager::detect(project_root));
        let cli_package = project_root.join("node_modules/@tailwindcss/cli");
        let searched = vec![local, cli_package.clone()];

        let Some(pm) = package_manager else {
            return Self::NotInstalled {
                package_manager: None,
                searched,
            };
        };

        // deno resolves npm: specifiers without a prior install
        if pm != PackageManager::Deno && !cli_package.is_dir() {
            return Self::NotInstalled {
                package_manager: Some(pm),
                searched,
            };
        }

        match pm.validate_binary().await {
            Ok(()) => Self::Found(TailwindProvider::PackageManager(pm)),
            Err(err) => {
                tracing::debug!(error = %err, "package manager binary missing");
                Self::PackageManagerMissing(pm)
            }
        }
    }

    pub fn into_result(self) -> Result<TailwindProvider, GeneratorError> {
        match self {
            Self::Found(provider) => Ok(provider),
            Self::PackageManagerMissing(pm) => Err(GeneratorError::PackageManagerNotFound {
                package_manager: pm.name().to_string(),
                binary_name: pm.binary_name().to_string(),
            }),
            Self::NotInstalled { searched, .. } => Err(GeneratorError::cli_not_found(searched)),
        }
    }
}

fn local_binary(project_root: &Path) -> PathBuf {
    let bin = project_root.join("node_modules").join(".bin");
    if cfg!(windows) {
        bin.join("tailwindcss.cmd")
    } else {
        bin.join("tailwindcss")
    }
}
