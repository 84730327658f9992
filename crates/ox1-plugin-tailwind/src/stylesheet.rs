//! Locating the project's global stylesheet.

use std::path::{Path, PathBuf};

/// Candidate global stylesheets, in lookup order.
pub const GLOBAL_STYLESHEETS: &[&str] = &[
    "app/globals.css",
    "src/app/globals.css",
    "app/global.css",
    "styles/globals.css",
    "src/styles/globals.css",
    "src/globals.css",
    "src/index.css",
    "globals.css",
];

/// First existing global stylesheet under `root`.
pub async fn find_global_stylesheet(root: &Path) -> Option<PathBuf> {
    for rel in GLOBAL_STYLESHEETS {
        let path = root.join(rel);
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            return Some(path);
        }
    }
    None
}

/// URL path a project file is served under.
pub fn url_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    format!("/{}", relative.to_string_lossy().replace('\\', "/").trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn follows_lookup_order() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_global_stylesheet(dir.path()).await, None);

        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.css"), "").unwrap();
        assert_eq!(
            find_global_stylesheet(dir.path()).await,
            Some(dir.path().join("src/index.css"))
        );

        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/globals.css"), "").unwrap();
        assert_eq!(
            find_global_stylesheet(dir.path()).await,
            Some(dir.path().join("app/globals.css"))
        );
    }

    #[test]
    fn url_paths_are_absolute() {
        let root = Path::new("/project");
        assert_eq!(url_path(root, Path::new("/project/app/globals.css")), "/app/globals.css");
    }
}
