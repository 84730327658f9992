//! MIME types and safe mapping of request paths onto the file system.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use tokio::fs;

/// Content type for a file, by extension.
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" | "cjs" | "jsx" | "tsx" | "ts" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Decode a request path and turn it into a relative path.
///
/// Returns `None` for anything that could leave the directory it is joined
/// onto: `..` segments, absolute or drive-prefixed components, backslashes
/// and NUL bytes.
pub fn sanitize(url_path: &str) -> Option<PathBuf> {
    let decoded: Cow<'_, str> = percent_decode_str(url_path).decode_utf8().ok()?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Map `url_path` to an existing file under `base`.
///
/// The resolved file must stay inside `base` after symlinks are followed.
pub async fn resolve_file(base: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = sanitize(url_path)?;
    if relative.as_os_str().is_empty() {
        return None;
    }

    let candidate = base.join(&relative);
    if !fs::metadata(&candidate).await.ok()?.is_file() {
        return None;
    }

    let base = fs::canonicalize(base).await.ok()?;
    let resolved = fs::canonicalize(&candidate).await.ok()?;
    resolved.starts_with(&base).then_some(resolved)
}

/// Source files a `.js` request may be served from, in preference order.
///
/// `/components/Button.js` can be backed by `Button.tsx`, `Button.ts` or
/// `Button.jsx`.
pub fn source_candidates(relative_js: &Path) -> Vec<PathBuf> {
    ["tsx", "ts", "jsx"]
        .iter()
        .map(|ext| relative_js.with_extension(ext))
        .collect()
}

/// Whether a request path looks like a page route rather than a file.
pub fn is_route(url_path: &str) -> bool {
    url_path == "/"
        || Path::new(url_path)
            .file_name()
            .is_some_and(|name| !name.to_string_lossy().contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn mime_types() {
        assert_eq!(mime_type(Path::new("a/index.html")), "text/html; charset=utf-8");
        assert_eq!(mime_type(Path::new("app.TSX")), "application/javascript; charset=utf-8");
        assert_eq!(mime_type(Path::new("style.css")), "text/css; charset=utf-8");
        assert_eq!(mime_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(mime_type(Path::new("font.woff2")), "font/woff2");
        assert_eq!(mime_type(Path::new("LICENSE")), "application/octet-stream");
    }

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize("/app/page.tsx"), Some(PathBuf::from("app/page.tsx")));
        assert_eq!(sanitize("/a/./b.css"), Some(PathBuf::from("a/b.css")));
        assert_eq!(sanitize("/my%20file.txt"), Some(PathBuf::from("my file.txt")));
        assert_eq!(sanitize("/../etc/passwd"), None);
        assert_eq!(sanitize("/a/%2e%2e/%2e%2e/secret"), None);
        assert_eq!(sanitize("/a\\..\\b"), None);
        assert_eq!(sanitize("/a%00b"), None);
    }

    #[tokio::test]
    async fn resolve_file_stays_inside_base() {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join("public");
        fs::create_dir_all(public.join("img")).unwrap();
        fs::write(public.join("img/logo.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("secret.txt"), "no").unwrap();

        let found = resolve_file(&public, "/img/logo.svg").await.unwrap();
        assert!(found.ends_with("img/logo.svg"));

        assert!(resolve_file(&public, "/img").await.is_none());
        assert!(resolve_file(&public, "/missing.png").await.is_none());
        assert!(resolve_file(&public, "/../secret.txt").await.is_none());
        assert!(resolve_file(&public, "/").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolve_file_rejects_escaping_symlinks() {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(dir.path().join("secret.txt"), "no").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), public.join("link.txt")).unwrap();

        assert!(resolve_file(&public, "/link.txt").await.is_none());
    }

    #[test]
    fn js_requests_map_to_sources() {
        assert_eq!(
            source_candidates(Path::new("components/Button.js")),
            vec![
                PathBuf::from("components/Button.tsx"),
                PathBuf::from("components/Button.ts"),
                PathBuf::from("components/Button.jsx"),
            ]
        );
    }

    #[test]
    fn routes() {
        assert!(is_route("/"));
        assert!(is_route("/about"));
        assert!(is_route("/blog/post-1"));
        assert!(!is_route("/app/page.tsx"));
        assert!(!is_route("/favicon.ico"));
    }
}
