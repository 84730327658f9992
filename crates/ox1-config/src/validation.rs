//! Semantic validation of a loaded configuration.

use crate::config::Ox1Config;
use crate::error::{ConfigError, Result};

/// Longest debounce window accepted; beyond this edits feel lost.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

impl Ox1Config {
    /// Reject values that would make the dev server misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.dev.host.trim().is_empty() {
            return Err(ConfigError::invalid("dev.host", "Host must not be empty"));
        }

        if self.dev.port == 0 {
            return Err(ConfigError::invalid("dev.port", "Port must be between 1 and 65535"));
        }

        if self.dev.sse_max_age_secs == 0 {
            return Err(ConfigError::invalid(
                "dev.sse_max_age_secs",
                "Must be greater than zero",
            ));
        }

        if self.dev.sse_sweep_interval_secs == 0 || self.dev.heartbeat_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "dev.sse_sweep_interval_secs",
                "Sweep and heartbeat intervals must be greater than zero",
            ));
        }

        if self.dev.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::invalid(
                "dev.debounce_ms",
                format!("Debounce window must be at most {MAX_DEBOUNCE_MS} ms"),
            ));
        }

        if self.tailwind.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "tailwind.timeout_secs",
                "Must be greater than zero",
            ));
        }

        if let Some(pm) = &self.tailwind.package_manager {
            if !matches!(pm.to_lowercase().as_str(), "pnpm" | "npm" | "bun" | "deno") {
                return Err(ConfigError::invalid(
                    "tailwind.package_manager",
                    format!("Unknown package manager '{pm}' (expected pnpm, npm, bun or deno)"),
                ));
            }
        }

        if !self.runtime.url_prefix.starts_with('/') {
            return Err(ConfigError::invalid(
                "runtime.url_prefix",
                "URL prefix must start with '/'",
            ));
        }

        Ok(())
    }
}
