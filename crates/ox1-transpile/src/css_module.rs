//! CSS modules: scoped class names via lightningcss and the JS mapping module.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use lightningcss::css_modules::{self, CssModuleReference};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use regex::Regex;

use crate::error::{Result, TranspileError};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "let", "static", "await",
];

/// A scoped CSS module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCss {
    pub code: String,

    /// Local class name -> space separated scoped class names
    pub classes: BTreeMap<String, String>,
}

/// Scope the class names of the CSS module at `path`.
///
/// Names follow `[hash]_[local]`; the hash derives from the path relative to
/// `root`, so a given file and class always scope to the same name.
pub fn scope_css_module(path: &Path, source: &str, root: &Path) -> Result<ScopedCss> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let filename = relative.to_string_lossy().replace('\\', "/");

    let stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.clone(),
            css_modules: Some(css_modules::Config::default()),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TranspileError::syntax(path, vec![e.to_string()]))?;

    let printed = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| TranspileError::internal(path, e.to_string()))?;

    let classes = printed
        .exports
        .unwrap_or_default()
        .into_iter()
        .map(|(local, export)| {
            let mut names = vec![export.name];
            for reference in export.composes {
                match reference {
                    CssModuleReference::Local { name } | CssModuleReference::Global { name } => {
                        names.push(name)
                    }
                    CssModuleReference::Dependency { name, specifier } => {
                        tracing::debug!(%name, %specifier, file = %filename, "cross-file composes is not resolved");
                    }
                }
            }
            (local, names.join(" "))
        })
        .collect();

    Ok(ScopedCss {
        code: printed.code,
        classes,
    })
}

/// Build the `.module.css.js` module for a scoped stylesheet served at `href`.
///
/// The module injects the scoped CSS once and exports the class map as
/// default, plus a named export for each identifier-safe class name.
pub fn css_module_script(href: &str, scoped: &ScopedCss) -> String {
    let css = serde_json::to_string(&scoped.code).unwrap_or_else(|_| "\"\"".into());
    let href_literal = serde_json::to_string(href).unwrap_or_else(|_| format!("\"{href}\""));
    let classes = serde_json::to_string_pretty(&scoped.classes).unwrap_or_else(|_| "{}".into());

    let mut out = format!(
        r#"const href = {href_literal};
let style = document.querySelector(`style[data-0x1-href="${{href}}"]`);
if (!style) {{
  style = document.createElement("style");
  style.setAttribute("data-0x1-href", href);
  document.head.appendChild(style);
}}
style.textContent = {css};

const classes = {classes};
export default classes;
"#
    );

    for local in scoped.classes.keys() {
        if IDENTIFIER.is_match(local) && !RESERVED.contains(&local.as_str()) {
            out.push_str(&format!("export const {local} = classes[\"{local}\"];\n"));
        }
    }

    out
}
