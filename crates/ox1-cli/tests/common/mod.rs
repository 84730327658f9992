#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ox1_cli::dev::{DevConfig, DevState, SharedState};
use ox1_config::Ox1Config;
use ox1_plugin_tailwind::{CssProcessor, GeneratorError, TailwindCache};
use tempfile::TempDir;

/// Write `files` (relative path, contents) under a fresh project directory.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        write(dir.path(), path, contents);
    }
    dir
}

pub fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

fn config(root: &Path) -> DevConfig {
    let mut settings = Ox1Config::default();
    settings.tailwind.enabled = false;
    DevConfig::new(
        root.canonicalize().unwrap(),
        settings,
        "127.0.0.1:0".parse().unwrap(),
    )
}

/// Dev state without Tailwind.
pub fn state(root: &Path) -> SharedState {
    DevState::with_tailwind(config(root), None).shared()
}

/// Dev state whose Tailwind cache runs [`UppercaseProcessor`].
pub fn state_with_tailwind(root: &Path) -> SharedState {
    let config = config(root);
    let cache = TailwindCache::new(config.root.clone(), Arc::new(UppercaseProcessor));
    DevState::with_tailwind(config, Some(Arc::new(cache))).shared()
}

/// Stand-in for the Tailwind CLI.
pub struct UppercaseProcessor;

#[async_trait]
impl CssProcessor for UppercaseProcessor {
    async fn process(&self, _stylesheet: &Path, input: &str) -> Result<String, GeneratorError> {
        Ok(input.to_uppercase())
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}
