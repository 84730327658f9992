//! Process-wide cache of the processed global stylesheet.
//!
//! Readers never wait: while a processing pass runs they keep getting the
//! previous result, and a successful pass swaps the new value in atomically.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use ox1_config::TailwindSettings;
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::error::TailwindError;
use crate::processor::{CssProcessor, TailwindCliProcessor};
use crate::stylesheet::{find_global_stylesheet, url_path};

/// Served until the first successful pass.
pub const PLACEHOLDER: &str = "/* 0x1: Tailwind CSS has not been processed yet */";

/// Fixed URL the processed stylesheet is always available under.
pub const TAILWIND_URL: &str = "/__0x1_tailwind.css";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Processing,
    Ready,
}

/// Output of one successful processing pass.
#[derive(Debug)]
pub struct ProcessedCss {
    pub content: Arc<str>,
    pub source: PathBuf,
    pub source_mtime: Option<SystemTime>,
    pub processed_at: DateTime<Utc>,
}

/// Source and mtime of the most recent pass, successful or not.
#[derive(Debug, Clone, PartialEq)]
struct Attempt {
    source: PathBuf,
    mtime: Option<SystemTime>,
    succeeded: bool,
}

impl Attempt {
    fn covers(&self, source: &Path, mtime: Option<SystemTime>) -> bool {
        self.source == source && self.mtime == mtime
    }
}

pub struct TailwindCache {
    project_root: PathBuf,
    processor: Arc<dyn CssProcessor>,
    current: RwLock<Option<Arc<ProcessedCss>>>,
    state: RwLock<CacheState>,
    last_attempt: RwLock<Option<Attempt>>,
    stale: AtomicBool,
    /// Serializes processing passes
    pass: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for TailwindCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailwindCache")
            .field("project_root", &self.project_root)
            .field("processor", &self.processor.name())
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl TailwindCache {
    pub fn new(project_root: PathBuf, processor: Arc<dyn CssProcessor>) -> Self {
        Self {
            project_root,
            processor,
            current: RwLock::new(None),
            state: RwLock::new(CacheState::Uninitialized),
            last_attempt: RwLock::new(None),
            stale: AtomicBool::new(false),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    /// Cache backed by the Tailwind CLI.
    pub fn with_settings(project_root: PathBuf, settings: TailwindSettings) -> Self {
        let processor = TailwindCliProcessor::new(project_root.clone(), settings);
        Self::new(project_root, Arc::new(processor))
    }

    pub fn state(&self) -> CacheState {
        *self.state.read()
    }

    pub fn current(&self) -> Option<Arc<ProcessedCss>> {
        self.current.read().clone()
    }

    /// Current processed CSS, or [`PLACEHOLDER`] before the first success.
    pub fn get_processed_tailwind_css(&self) -> Arc<str> {
        match &*self.current.read() {
            Some(processed) => Arc::clone(&processed.content),
            None => Arc::from(PLACEHOLDER),
        }
    }

    /// URL of the global stylesheet the cache stands in for.
    pub async fn stylesheet_url(&self) -> Option<String> {
        let source = match self.current() {
            Some(processed) => processed.source.clone(),
            None => find_global_stylesheet(&self.project_root).await?,
        };
        Some(url_path(&self.project_root, &source))
    }

    /// Whether a request for `url` should be answered from the cache.
    pub async fn is_tailwind_stylesheet(&self, url: &str) -> bool {
        url == TAILWIND_URL || self.stylesheet_url().await.is_some_and(|u| u == url)
    }

    /// Force the next pass to run even if the stylesheet is unchanged.
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    /// Whether the stylesheet changed since the last pass.
    ///
    /// A failed pass is not repeated until the stylesheet changes or
    /// [`invalidate`](Self::invalidate) is called.
    pub async fn needs_refresh(&self) -> bool {
        let Some(stylesheet) = find_global_stylesheet(&self.project_root).await else {
            return false;
        };
        if self.stale.load(Ordering::SeqCst) {
            return true;
        }
        let mtime = modified(&stylesheet).await;
        !self
            .last_attempt
            .read()
            .as_ref()
            .is_some_and(|attempt| attempt.covers(&stylesheet, mtime))
    }

    /// Process the global stylesheet.
    ///
    /// Returns `true` when the cache holds output for the current stylesheet.
    /// Failures are logged and the previous value stays in place. An
    /// unchanged stylesheet whose last pass failed is not reprocessed.
    pub async fn process_tailwind_css(&self) -> bool {
        match self.refresh().await {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::warn!(error = %err, "tailwind processing failed, keeping previous css");
                false
            }
        }
    }

    async fn refresh(&self) -> Result<bool, TailwindError> {
        let _pass = self.pass.lock().await;

        let stylesheet =
            find_global_stylesheet(&self.project_root).await.ok_or_else(|| TailwindError::NoStylesheet {
                root: self.project_root.clone(),
            })?;
        let mtime = modified(&stylesheet).await;

        let stale = self.stale.swap(false, Ordering::SeqCst);
        if !stale {
            let previous = self.last_attempt.read().clone();
            if let Some(attempt) = previous.filter(|a| a.covers(&stylesheet, mtime)) {
                tracing::trace!(succeeded = attempt.succeeded, "tailwind css unchanged");
                return Ok(attempt.succeeded);
            }
        }

        *self.state.write() = CacheState::Processing;
        let result = self.run_pass(&stylesheet, mtime).await;
        *self.last_attempt.write() = Some(Attempt {
            source: stylesheet,
            mtime,
            succeeded: result.is_ok(),
        });

        let settled = if self.current.read().is_some() {
            CacheState::Ready
        } else {
            CacheState::Uninitialized
        };
        *self.state.write() = settled;

        result.map(|()| true)
    }

    async fn run_pass(&self, stylesheet: &Path, mtime: Option<SystemTime>) -> Result<(), TailwindError> {
        let input = tokio::fs::read_to_string(stylesheet)
            .await
            .map_err(|source| TailwindError::Read {
                path: stylesheet.to_path_buf(),
                source,
            })?;

        let started = std::time::Instant::now();
        let css = self.processor.process(stylesheet, &input).await?;

        let processed = ProcessedCss {
            content: Arc::from(css),
            source: stylesheet.to_path_buf(),
            source_mtime: mtime,
            processed_at: Utc::now(),
        };
        tracing::info!(
            stylesheet = %stylesheet.display(),
            bytes = processed.content.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tailwind css processed"
        );
        *self.current.write() = Some(Arc::new(processed));
        Ok(())
    }

    /// Reprocess whenever the stylesheet changes, checked every `interval`.
    ///
    /// The first check runs immediately.
    pub fn spawn_periodic_check(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if cache.needs_refresh().await {
                    tracing::debug!("global stylesheet changed, reprocessing");
                    cache.process_tailwind_css().await;
                }
            }
        })
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}
