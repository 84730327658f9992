//! In-process component transpiler for the 0x1 development server.
//!
//! Turns `.tsx`/`.jsx`/`.ts` sources into browser-ready ES modules:
//!
//! ```text
//! source ─► CSS import extraction ─► OXC (TS strip, JSX, defines) ─► specifier rewrite ─► JS
//!                    │
//!                    └─► stylesheet loader prepended to the output
//! ```
//!
//! Failures are typed ([`TranspileError`]); syntax and internal failures are
//! meant to be served as a [`fallback_component`] so the page keeps rendering.

mod cache;
mod css_module;
mod error;
mod fallback;
mod imports;
mod options;
mod transform;

pub use cache::{CachedModule, ModuleKind, TranspileCache, Transpiler};
pub use css_module::{css_module_script, scope_css_module, ScopedCss};
pub use error::{Result, TranspileError};
pub use fallback::fallback_component;
pub use imports::{extract_css_imports, rewrite_specifiers, stylesheet_loader, CssImports};
pub use options::TranspileOptions;
pub use transform::{is_transpilable, transpile_source};

/// Content type of every module this crate produces.
pub const JS_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";

/// Cache headers for transpiled output; modules change on every save.
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
