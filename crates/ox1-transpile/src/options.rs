use std::path::PathBuf;

/// Settings shared by every transpilation in one dev session.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Project root; module URLs are computed relative to it
    pub root: PathBuf,

    /// URL prefix the framework runtime is served under (`/0x1`)
    pub runtime_prefix: String,

    /// Import source for the automatic JSX runtime
    pub jsx_import_source: String,

    /// Browser target handed to the syntax lowering passes
    pub target: String,
}

impl TranspileOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            runtime_prefix: "/0x1".into(),
            jsx_import_source: "react".into(),
            target: "es2020".into(),
        }
    }

    pub fn with_runtime_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.runtime_prefix = prefix.into();
        self
    }

    pub fn with_jsx_import_source(mut self, source: impl Into<String>) -> Self {
        self.jsx_import_source = source.into();
        self
    }

    pub(crate) fn runtime_url(&self, module: &str) -> String {
        format!("{}/{}.js", self.runtime_prefix.trim_end_matches('/'), module)
    }
}
