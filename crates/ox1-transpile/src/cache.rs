//! Transpile cache and the async front end used by the dev server.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use dashmap::DashMap;

use crate::css_module::{css_module_script, scope_css_module};
use crate::error::{Result, TranspileError};
use crate::fallback::fallback_component;
use crate::options::TranspileOptions;
use crate::transform::{is_transpilable, transpile_source};

/// What a cached module was produced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Component,
    CssModuleScript,
    ScopedCss,
}

impl ModuleKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ModuleKind::Component | ModuleKind::CssModuleScript => crate::JS_CONTENT_TYPE,
            ModuleKind::ScopedCss => "text/css; charset=utf-8",
        }
    }
}

/// A processed module ready to serve.
#[derive(Debug, Clone)]
pub struct CachedModule {
    pub content: Arc<str>,
    pub content_type: &'static str,
    pub mtime: SystemTime,
    pub processed_at: Instant,
}

/// Processed modules keyed by source path and kind.
///
/// An entry is valid only while the source mtime matches; there is no
/// eviction.
#[derive(Debug, Default)]
pub struct TranspileCache {
    entries: DashMap<(PathBuf, ModuleKind), CachedModule>,
}

impl TranspileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path, kind: ModuleKind, mtime: SystemTime) -> Option<CachedModule> {
        let entry = self.entries.get(&(path.to_path_buf(), kind))?;
        (entry.mtime == mtime).then(|| entry.clone())
    }

    pub fn insert(&self, path: PathBuf, kind: ModuleKind, mtime: SystemTime, content: Arc<str>) {
        self.entries.insert(
            (path, kind),
            CachedModule {
                content,
                content_type: kind.content_type(),
                mtime,
                processed_at: Instant::now(),
            },
        );
    }

    /// Drop every entry derived from `path`.
    pub fn invalidate(&self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(p, _), _| p != path);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Cached, async transpiler for one project.
#[derive(Debug)]
pub struct Transpiler {
    options: Arc<TranspileOptions>,
    cache: TranspileCache,
}

impl Transpiler {
    pub fn new(options: TranspileOptions) -> Self {
        Self {
            options: Arc::new(options),
            cache: TranspileCache::new(),
        }
    }

    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    pub fn cache(&self) -> &TranspileCache {
        &self.cache
    }

    /// URL a project file is served under (`/app/page.tsx`).
    pub fn module_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.options.root).unwrap_or(path);
        let url = relative.to_string_lossy().replace('\\', "/");
        if url.starts_with('/') { url } else { format!("/{url}") }
    }

    /// Transpile a component, reusing the cached output while its mtime holds.
    pub async fn get_or_transpile(&self, path: &Path) -> Result<CachedModule> {
        if !is_transpilable(path) {
            return Err(TranspileError::Unsupported(path.to_path_buf()));
        }

        self.cached_or_else(path, ModuleKind::Component, |path, source, options, url| {
            transpile_source(path, &source, &url, options)
        })
        .await
    }

    /// Scoped CSS for a `.module.css` file.
    pub async fn scoped_css(&self, path: &Path) -> Result<CachedModule> {
        self.cached_or_else(path, ModuleKind::ScopedCss, |path, source, options, _| {
            scope_css_module(path, &source, &options.root).map(|scoped| scoped.code)
        })
        .await
    }

    /// The `.module.css.js` mapping module for a `.module.css` file.
    pub async fn css_module_script(&self, path: &Path) -> Result<CachedModule> {
        self.cached_or_else(path, ModuleKind::CssModuleScript, |path, source, options, url| {
            scope_css_module(path, &source, &options.root)
                .map(|scoped| css_module_script(&url, &scoped))
        })
        .await
    }

    /// Fallback module for a component whose transpilation failed.
    pub fn fallback(&self, path: &Path, error: &TranspileError) -> String {
        fallback_component(&self.module_url(path), &error.to_string(), &self.options)
    }

    /// Serve from the cache or run `produce` on the blocking pool.
    async fn cached_or_else<F>(&self, path: &Path, kind: ModuleKind, produce: F) -> Result<CachedModule>
    where
        F: FnOnce(&Path, String, &TranspileOptions, String) -> Result<String> + Send + 'static,
    {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        if !metadata.is_file() {
            return Err(TranspileError::NotFound(path.to_path_buf()));
        }
        let mtime = metadata
            .modified()
            .map_err(|e| TranspileError::internal(path, e.to_string()))?;

        if let Some(hit) = self.cache.get(path, kind, mtime) {
            tracing::trace!(path = %path.display(), ?kind, "transpile cache hit");
            return Ok(hit);
        }

        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_error(path, e))?;

        let started = Instant::now();
        let options = Arc::clone(&self.options);
        let url = self.module_url(path);
        let owned = path.to_path_buf();
        let output = tokio::task::spawn_blocking(move || produce(&owned, source, &options, url))
            .await
            .map_err(|e| TranspileError::internal(path, format!("transpile task failed: {e}")))??;
        tracing::debug!(
            path = %path.display(),
            ?kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transpiled"
        );

        self.cache.insert(path.to_path_buf(), kind, mtime, Arc::from(output));
        self.cache
            .get(path, kind, mtime)
            .ok_or_else(|| TranspileError::internal(path, "cache entry vanished after insert"))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> TranspileError {
    match err.kind() {
        ErrorKind::NotFound => TranspileError::NotFound(path.to_path_buf()),
        _ => TranspileError::internal(path, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn project() -> (TempDir, Transpiler) {
        let dir = TempDir::new().unwrap();
        let transpiler = Transpiler::new(TranspileOptions::new(dir.path()));
        (dir, transpiler)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn caches_until_mtime_changes() {
        let (dir, transpiler) = project();
        let file = dir.path().join("page.tsx");
        fs::write(&file, "export default () => <p>one</p>;").unwrap();

        let first = transpiler.get_or_transpile(&file).await.unwrap();
        let second = transpiler.get_or_transpile(&file).await.unwrap();
        assert!(Arc::ptr_eq(&first.content, &second.content));
        assert_eq!(first.content_type, crate::JS_CONTENT_TYPE);

        std::thread::sleep(Duration::from_millis(20));
        fs::write(&file, "export default () => <p>two</p>;").unwrap();
        let bumped = SystemTime::now() + Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(bumped)
            .unwrap();

        let third = transpiler.get_or_transpile(&file).await.unwrap();
        assert!(third.content.contains("two"));
        assert_eq!(transpiler.cache().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_file_is_not_found() {
        let (dir, transpiler) = project();
        let err = transpiler
            .get_or_transpile(&dir.path().join("nope.tsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranspileError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn css_module_outputs_are_cached_separately() {
        let (dir, transpiler) = project();
        let file = dir.path().join("button.module.css");
        fs::write(&file, ".button { color: red; }").unwrap();

        let css = transpiler.scoped_css(&file).await.unwrap();
        let script = transpiler.css_module_script(&file).await.unwrap();

        assert!(css.content_type.starts_with("text/css"));
        assert!(script.content.contains("export default classes;"));
        assert!(script.content.contains("\"/button.module.css\""));
        assert_eq!(transpiler.cache().len(), 2);
        assert_eq!(transpiler.cache().invalidate(&file), 2);
        assert!(transpiler.cache().is_empty());
    }

    #[tokio::test]
    async fn transpiles_on_a_current_thread_runtime() {
        let (dir, transpiler) = project();
        let file = dir.path().join("page.tsx");
        fs::write(&file, "export default () => <main>hi</main>;").unwrap();

        let module = transpiler.get_or_transpile(&file).await.unwrap();
        assert!(module.content.contains("hi"));
        assert!(!module.content.contains("<main>"));

        let css = dir.path().join("card.module.css");
        fs::write(&css, ".card { color: blue; }").unwrap();
        assert!(transpiler.scoped_css(&css).await.is_ok());
    }

    #[test]
    fn module_url_is_root_relative() {
        let transpiler = Transpiler::new(TranspileOptions::new("/project"));
        assert_eq!(transpiler.module_url(Path::new("/project/app/page.tsx")), "/app/page.tsx");
    }
}
