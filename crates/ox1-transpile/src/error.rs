use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranspileError>;

/// Why a module could not be transpiled.
#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),

    /// Parse or transform diagnostics
    #[error("failed to compile {}:\n{}", path.display(), messages.join("\n"))]
    Syntax { path: PathBuf, messages: Vec<String> },

    #[error("internal transpiler error in {}: {message}", path.display())]
    Internal { path: PathBuf, message: String },
}

impl TranspileError {
    pub fn syntax(path: &Path, messages: Vec<String>) -> Self {
        Self::Syntax {
            path: path.to_path_buf(),
            messages,
        }
    }

    pub fn internal(path: &Path, message: impl Into<String>) -> Self {
        Self::Internal {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether the server should answer with a fallback component.
    pub fn wants_fallback(&self) -> bool {
        matches!(self, Self::Syntax { .. } | Self::Internal { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::Unsupported(p) => p,
            Self::Syntax { path, .. } | Self::Internal { path, .. } => path,
        }
    }
}
