//! Configuration types and layered loading.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::discovery::{ConfigDiscovery, ConfigSource};
use crate::error::{ConfigError, Result};

/// Prefix for environment overrides (`OX1_DEV__PORT=4000`).
pub const ENV_PREFIX: &str = "OX1_";

/// Top-level 0x1 configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ox1Config {
    pub dev: DevSettings,
    pub tailwind: TailwindSettings,
    pub runtime: RuntimeSettings,
}

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevSettings {
    pub host: String,

    pub port: u16,

    /// Open the browser once the server is listening
    pub open: bool,

    /// Window in which repeated events for one path collapse into one change
    pub debounce_ms: u64,

    /// Paths dropped by the file watcher (prefix, substring or `*.ext`)
    pub ignore: Vec<String>,

    /// SSE clients idle for longer than this are reaped
    pub sse_max_age_secs: u64,

    pub sse_sweep_interval_secs: u64,

    pub heartbeat_interval_secs: u64,

    /// Directory of static assets served before the project root
    pub public_dir: PathBuf,

    /// Component mounted by the generated HTML shell
    pub entry: String,
}

impl Default for DevSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 3000,
            open: false,
            debounce_ms: 100,
            ignore: default_ignore(),
            sse_max_age_secs: 30,
            sse_sweep_interval_secs: 15,
            heartbeat_interval_secs: 10,
            public_dir: PathBuf::from("public"),
            entry: "app/page.tsx".into(),
        }
    }
}

/// Tailwind CSS processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailwindSettings {
    pub enabled: bool,

    /// Install the Tailwind CLI with the project's package manager when missing
    pub auto_install: bool,

    /// Force a package manager ("pnpm", "npm", "bun", "deno")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,

    pub minify: bool,

    /// Upper bound on a single Tailwind CLI run
    pub timeout_secs: u64,

    /// How often the global stylesheet mtime is checked
    pub check_interval_ms: u64,
}

impl Default for TailwindSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_install: false,
            package_manager: None,
            config_file: None,
            minify: false,
            timeout_secs: 30,
            check_interval_ms: 2000,
        }
    }
}

/// Where the framework runtime modules live and how components import them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// URL prefix the runtime modules are served under
    pub url_prefix: String,

    /// Directory (relative to the project root) holding the runtime modules
    pub dir: PathBuf,

    /// Import source handed to the automatic JSX transform
    pub jsx_import_source: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            url_prefix: "/0x1".into(),
            dir: PathBuf::from("node_modules/0x1/dist"),
            jsx_import_source: "react".into(),
        }
    }
}

impl RuntimeSettings {
    /// URL of a runtime module, e.g. `module_url("jsx-runtime")` -> `/0x1/jsx-runtime.js`.
    pub fn module_url(&self, module: &str) -> String {
        format!("{}/{}.js", self.url_prefix.trim_end_matches('/'), module)
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_ignore() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        ".0x1",
        "*.log",
        ".DS_Store",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Ox1Config {
    /// Load configuration for the project at `root`.
    ///
    /// Priority: environment > config file > defaults.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_with(root, None::<&()>)
    }

    /// Load configuration and merge `overrides` on top of every other source.
    ///
    /// `overrides` should serialize to a partial config (e.g. `{"dev": {"port": 4000}}`)
    /// with unset fields skipped.
    pub fn load_with<T: Serialize>(root: &Path, overrides: Option<&T>) -> Result<Self> {
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound(root.to_path_buf()));
        }

        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match ConfigDiscovery::new(root).find() {
            Some(ConfigSource::Toml(path)) => {
                tracing::debug!(path = %path.display(), "loading ox1.toml");
                figment = figment.merge(Toml::file(path));
            }
            Some(ConfigSource::PackageJson(path)) => {
                tracing::debug!(path = %path.display(), "loading \"0x1\" field from package.json");
                let value = ConfigDiscovery::read_package_json_field(&path)?;
                figment = figment.merge(Serialized::defaults(value));
            }
            None => {}
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML, as written by `ox1.toml`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::invalid("toml", e.to_string()))
    }
}
