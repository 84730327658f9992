//! File system watcher with per-path debouncing.
//!
//! Watches the whole project, drops ignored paths and turns each remaining
//! change into a [`FileChange`]; [`FileChange::reload_event`] decides what the
//! browser should do about it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::dev::protocol::ReloadEvent;
use crate::error::{CliError, Result};

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    /// Stylesheets are patched in place; everything else reloads the page.
    pub fn reload_event(&self, root: &Path) -> ReloadEvent {
        let path = self.path();
        let is_css = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("css"));

        if is_css {
            ReloadEvent::css(url_path(root, path))
        } else {
            ReloadEvent::FullReload
        }
    }

    fn from_event(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

/// `/app/globals.css` for `<root>/app/globals.css`.
pub fn url_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    format!(
        "/{}",
        relative.to_string_lossy().replace('\\', "/").trim_start_matches('/')
    )
}

/// Collapses repeated events for one path inside a time window.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    last_seen: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Whether an event for `path` at `now` should be forwarded.
    fn admit(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(last) = self.last_seen.get(path) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }
        self.last_seen.insert(path.to_path_buf(), now);

        if self.last_seen.len() > 1024 {
            let window = self.window;
            self.last_seen.retain(|_, seen| now.duration_since(*seen) < window);
        }
        true
    }
}

/// Recursive project watcher.
///
/// Dropping it stops watching.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Returns the watcher and the receiver that yields debounced, filtered
    /// changes. Watch errors are logged and do not end the stream.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }
        // Events carry canonical paths on platforms with symlinked temp dirs.
        let root = root.canonicalize()?;

        let (tx, rx) = mpsc::channel(100);
        let mut debouncer = Debouncer::new(Duration::from_millis(debounce_ms));
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    return;
                }
            };

            for path in event.paths {
                if should_ignore(&path, &watch_root, &ignore_patterns) {
                    continue;
                }
                let Some(change) = FileChange::from_event(&event.kind, path) else {
                    continue;
                };
                if !debouncer.admit(change.path(), Instant::now()) {
                    continue;
                }

                tracing::debug!(?change, "file changed");
                if tx.blocking_send(change).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "watching project");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Get the root directory being watched (canonicalized).
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Check if a path should be ignored.
///
/// Paths outside `root` and hidden components are always ignored; `*.ext`
/// patterns match by suffix, other patterns by prefix or path segment.
pub fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let rel_path = match path.strip_prefix(root) {
        Ok(p) => p,
        Err(_) => return true,
    };

    let path_str = rel_path.to_string_lossy().replace('\\', "/");

    for pattern in ignore_patterns {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if path_str.ends_with(suffix) {
                return true;
            }
        } else if path_str.starts_with(pattern.as_str())
            || path_str.contains(&format!("/{}", pattern))
        {
            return true;
        }
    }

    rel_path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_should_ignore_node_modules() {
        let root = PathBuf::from("/project");
        let patterns = patterns(&["node_modules"]);

        let path = PathBuf::from("/project/node_modules/package/index.js");
        assert!(should_ignore(&path, &root, &patterns));

        let path = PathBuf::from("/project/packages/ui/node_modules/x.js");
        assert!(should_ignore(&path, &root, &patterns));

        let path = PathBuf::from("/project/app/page.tsx");
        assert!(!should_ignore(&path, &root, &patterns));
    }

    #[test]
    fn test_should_ignore_extension() {
        let root = PathBuf::from("/project");
        let patterns = patterns(&["*.log"]);

        assert!(should_ignore(Path::new("/project/debug.log"), &root, &patterns));
        assert!(!should_ignore(Path::new("/project/app/page.tsx"), &root, &patterns));
    }

    #[test]
    fn test_should_ignore_hidden_and_outside() {
        let root = PathBuf::from("/project");

        assert!(should_ignore(Path::new("/project/.git/config"), &root, &[]));
        assert!(should_ignore(Path::new("/project/.0x1/cache.json"), &root, &[]));
        assert!(should_ignore(Path::new("/project/app/.hidden/x.tsx"), &root, &[]));
        assert!(should_ignore(Path::new("/other/file.tsx"), &root, &[]));
    }

    #[test]
    fn test_reload_event_classification() {
        let root = Path::new("/project");

        let change = FileChange::Modified(PathBuf::from("/project/app/globals.css"));
        assert_eq!(change.reload_event(root), ReloadEvent::css("/app/globals.css"));

        let change = FileChange::Created(PathBuf::from("/project/components/Button.module.css"));
        assert_eq!(
            change.reload_event(root),
            ReloadEvent::css("/components/Button.module.css")
        );

        let change = FileChange::Removed(PathBuf::from("/project/app/page.tsx"));
        assert_eq!(change.reload_event(root), ReloadEvent::FullReload);
    }

    #[test]
    fn test_event_kinds() {
        use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
        let p = || PathBuf::from("/project/a.tsx");

        assert!(matches!(
            FileChange::from_event(&EventKind::Create(CreateKind::File), p()),
            Some(FileChange::Created(_))
        ));
        assert!(matches!(
            FileChange::from_event(&EventKind::Modify(ModifyKind::Any), p()),
            Some(FileChange::Modified(_))
        ));
        assert!(matches!(
            FileChange::from_event(&EventKind::Remove(RemoveKind::File), p()),
            Some(FileChange::Removed(_))
        ));
        assert_eq!(FileChange::from_event(&EventKind::Access(AccessKind::Any), p()), None);
    }

    #[test]
    fn test_debounce_is_per_path() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();
        let a = Path::new("/project/a.tsx");
        let b = Path::new("/project/b.tsx");

        assert!(debouncer.admit(a, start));
        assert!(!debouncer.admit(a, start + Duration::from_millis(20)));
        assert!(debouncer.admit(b, start + Duration::from_millis(20)));
        assert!(debouncer.admit(a, start + Duration::from_millis(150)));
    }
}
