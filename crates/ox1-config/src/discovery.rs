//! File-based config discovery.
//!
//! Finds the project's 0x1 configuration in its conventional locations.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Name of the TOML config file.
pub const CONFIG_FILE: &str = "ox1.toml";

/// Key holding inline configuration in `package.json`.
pub const PACKAGE_JSON_KEY: &str = "0x1";

/// Where a discovered configuration lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Toml(PathBuf),
    PackageJson(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Toml(p) | ConfigSource::PackageJson(p) => p,
        }
    }
}

/// Searches a project root for 0x1 configuration.
///
/// # Example
///
/// ```no_run
/// use ox1_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// if let Some(source) = discovery.find() {
///     println!("config at {}", source.path().display());
/// }
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config source in the root directory.
    ///
    /// Searches in this order:
    /// 1. `ox1.toml`
    /// 2. `package.json` with a non-null `"0x1"` field
    pub fn find(&self) -> Option<ConfigSource> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.is_file() {
            return Some(ConfigSource::Toml(toml_path));
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        match parsed.get(PACKAGE_JSON_KEY) {
            Some(v) if !v.is_null() => Some(ConfigSource::PackageJson(pkg_path)),
            _ => None,
        }
    }

    /// Read the `"0x1"` object out of a `package.json`.
    pub fn read_package_json_field(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;

        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid("package.json", format!("Invalid JSON: {e}")))?;

        let value = parsed
            .get(PACKAGE_JSON_KEY)
            .cloned()
            .ok_or_else(|| ConfigError::invalid(PACKAGE_JSON_KEY, "Add a \"0x1\" field to package.json"))?;

        if !value.is_object() {
            return Err(ConfigError::invalid(
                PACKAGE_JSON_KEY,
                "The \"0x1\" field must be an object",
            ));
        }

        Ok(value)
    }
}
