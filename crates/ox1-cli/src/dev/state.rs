//! Shared state for the development server.
//!
//! One [`DevState`] is shared by every request handler and the change loop.

use std::sync::Arc;

use ox1_plugin_tailwind::TailwindCache;
use ox1_transpile::{TranspileOptions, Transpiler};

use crate::dev::broadcaster::{BroadcastReport, Broadcaster};
use crate::dev::config::DevConfig;
use crate::dev::protocol::ReloadEvent;
use crate::dev::watcher::FileChange;

/// Shared state handle.
pub type SharedState = Arc<DevState>;

pub struct DevState {
    pub config: DevConfig,
    pub broadcaster: Arc<Broadcaster>,
    pub transpiler: Transpiler,
    /// `None` when Tailwind processing is disabled
    pub tailwind: Option<Arc<TailwindCache>>,
}

impl DevState {
    /// State backed by the Tailwind CLI, when enabled in the settings.
    pub fn new(config: DevConfig) -> Self {
        let tailwind = config.settings.tailwind.enabled.then(|| {
            Arc::new(TailwindCache::with_settings(
                config.root.clone(),
                config.settings.tailwind.clone(),
            ))
        });
        Self::with_tailwind(config, tailwind)
    }

    pub fn with_tailwind(config: DevConfig, tailwind: Option<Arc<TailwindCache>>) -> Self {
        let runtime = &config.settings.runtime;
        let options = TranspileOptions::new(config.root.clone())
            .with_runtime_prefix(runtime.url_prefix.clone())
            .with_jsx_import_source(runtime.jsx_import_source.clone());

        Self {
            transpiler: Transpiler::new(options),
            broadcaster: Arc::new(Broadcaster::new()),
            tailwind,
            config,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// React to a file change: drop stale caches, bring the Tailwind output up
    /// to date and tell every browser.
    ///
    /// Tailwind runs before the broadcast so a reloading page never fetches
    /// the previous CSS.
    pub async fn handle_change(&self, change: &FileChange) -> (ReloadEvent, BroadcastReport) {
        let path = change.path();
        let dropped = self.transpiler.cache().invalidate(path);
        if dropped > 0 {
            tracing::debug!(path = %path.display(), dropped, "invalidated transpiled modules");
        }

        let event = change.reload_event(&self.config.root);

        if let Some(tailwind) = &self.tailwind {
            // Utility classes are scanned from components too.
            let affects_css = match &event {
                ReloadEvent::CssUpdate { .. } => true,
                ReloadEvent::FullReload => ox1_transpile::is_transpilable(path),
            };
            if affects_css && tailwind.stylesheet_url().await.is_some() {
                tailwind.invalidate();
                tailwind.process_tailwind_css().await;
            }
        }

        let report = self.broadcaster.broadcast(&event);
        (event, report)
    }
}
