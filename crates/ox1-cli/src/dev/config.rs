//! Development server configuration.
//!
//! Resolves the project root, loads [`Ox1Config`] with the command-line
//! overrides on top and picks a free port.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use ox1_config::Ox1Config;
use serde::Serialize;

use crate::cli::DevArgs;
use crate::error::{CliError, Result, ResultExt};

/// How many ports after the requested one are tried.
pub const PORT_ATTEMPTS: u16 = 10;

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Loaded project configuration
    pub settings: Ox1Config,

    /// Address the server binds
    pub addr: SocketAddr,

    /// Canonical project root
    pub root: PathBuf,
}

/// Command-line values layered over every other config source.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "DevOverrides::is_empty")]
    dev: DevOverrides,
    #[serde(skip_serializing_if = "TailwindOverrides::is_empty")]
    tailwind: TailwindOverrides,
}

#[derive(Debug, Default, Serialize)]
struct DevOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<bool>,
}

impl DevOverrides {
    fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.open.is_none()
    }
}

#[derive(Debug, Default, Serialize)]
struct TailwindOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
}

impl TailwindOverrides {
    fn is_empty(&self) -> bool {
        self.enabled.is_none()
    }
}

impl Overrides {
    fn from_args(args: &DevArgs) -> Self {
        Self {
            dev: DevOverrides {
                host: args.host.clone(),
                port: args.port,
                open: args.open.then_some(true),
            },
            tailwind: TailwindOverrides {
                enabled: args.no_tailwind.then_some(false),
            },
        }
    }
}

impl DevConfig {
    /// Create DevConfig from CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the project root does not exist, the configuration
    /// is invalid or no port in range is free.
    pub fn from_args(args: &DevArgs) -> Result<Self> {
        let root = match &args.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()?,
        };
        let root = root.canonicalize().with_path(&root)?;

        let settings = Ox1Config::load_with(&root, Some(&Overrides::from_args(args)))?;
        let ip: IpAddr = settings.dev.host.parse().map_err(|_| {
            CliError::InvalidArgument(format!(
                "'{}' is not an IP address (use e.g. 127.0.0.1 or 0.0.0.0)",
                settings.dev.host
            ))
        })?;
        let addr = Self::find_available_port(ip, settings.dev.port)?;

        Ok(Self {
            settings,
            addr,
            root,
        })
    }

    /// Configuration for an already chosen address, without probing ports.
    pub fn new(root: PathBuf, settings: Ox1Config, addr: SocketAddr) -> Self {
        Self {
            settings,
            addr,
            root,
        }
    }

    /// Try `requested_port`, then up to [`PORT_ATTEMPTS`] ports after it.
    pub fn find_available_port(ip: IpAddr, requested_port: u16) -> Result<SocketAddr> {
        if requested_port < 1024 {
            crate::ui::warning(&format!(
                "Port {} is in privileged range, may require root access",
                requested_port
            ));
        }

        for offset in 0..=PORT_ATTEMPTS {
            let Some(port) = requested_port.checked_add(offset) else {
                break;
            };
            let addr = SocketAddr::new(ip, port);
            if TcpListener::bind(addr).is_ok() {
                if offset > 0 {
                    crate::ui::warning(&format!(
                        "Port {} is busy, using port {} instead",
                        requested_port, port
                    ));
                }
                return Ok(addr);
            }
        }

        Err(CliError::Server(format!(
            "Ports {}-{} are all in use",
            requested_port,
            requested_port.saturating_add(PORT_ATTEMPTS)
        )))
    }

    /// Get the server URL as a string.
    pub fn server_url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}", host, self.addr.port())
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.settings.dev.public_dir)
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join(&self.settings.runtime.dir)
    }

    pub fn sse_max_age(&self) -> Duration {
        Duration::from_secs(self.settings.dev.sse_max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.settings.dev.sse_sweep_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.settings.dev.heartbeat_interval_secs)
    }
}
