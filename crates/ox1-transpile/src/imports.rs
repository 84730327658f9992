//! Import handling around the OXC pass: CSS import extraction before it,
//! specifier rewriting on the transformed AST.

use std::path::Path;
use std::sync::LazyLock;

use oxc_ast::AstBuilder;
use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression,
    Program, StringLiteral,
};
use oxc_ast_visit::{VisitMut, walk_mut};
use path_clean::PathClean;
use regex::{Captures, Regex};

use crate::options::TranspileOptions;

static CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import[ \t]+(?:([^"'\n;]+?)[ \t]+from[ \t]+)?["']([^"'\n]+\.css)["'][ \t]*;?[ \t]*$"#,
    )
    .expect("css import pattern is valid")
});

/// Extensions a relative import may already carry.
const KNOWN_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "tsx", "css", "json"];

/// Result of pulling CSS imports out of a component source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssImports {
    /// Source with plain CSS imports removed and CSS-module imports pointed
    /// at their `.module.css.js` mapping modules
    pub code: String,

    /// Absolute URLs of stylesheets the module must load at runtime
    pub stylesheets: Vec<String>,
}

/// Extract CSS imports from `source`, a module served at `module_url`.
///
/// `import styles from "./x.module.css"` becomes an import of
/// `./x.module.css.js`; any other CSS import is dropped from the code and its
/// resolved URL recorded in [`CssImports::stylesheets`].
pub fn extract_css_imports(source: &str, module_url: &str) -> CssImports {
    let mut stylesheets = Vec::new();

    let code = CSS_IMPORT.replace_all(source, |caps: &Captures| {
        let specifier = &caps[2];
        match caps.get(1) {
            Some(binding) if specifier.ends_with(".module.css") => {
                format!("import {} from \"{specifier}.js\";", binding.as_str().trim())
            }
            _ => {
                let href = resolve_stylesheet_href(module_url, specifier);
                if !stylesheets.contains(&href) {
                    stylesheets.push(href);
                }
                String::new()
            }
        }
    });

    CssImports {
        code: code.into_owned(),
        stylesheets,
    }
}

/// Resolve a CSS import specifier against the importing module's URL.
fn resolve_stylesheet_href(module_url: &str, specifier: &str) -> String {
    if specifier.starts_with('/') {
        return specifier.to_string();
    }
    if !specifier.starts_with('.') {
        return format!("/node_modules/{specifier}");
    }

    let base = Path::new(module_url).parent().unwrap_or(Path::new("/"));
    let resolved = Path::new("/").join(base).join(specifier).clean();
    resolved.to_string_lossy().replace('\\', "/")
}

/// Rewrite module specifiers in `program` so the browser can load them.
///
/// Covers static imports, re-exports and `import()` calls with a literal
/// argument. Framework and React specifiers map to the runtime served under
/// [`TranspileOptions::runtime_prefix`]; extensionless relative imports get a
/// `.js` suffix. Anything else is left untouched.
pub fn rewrite_specifiers<'a>(
    ast: AstBuilder<'a>,
    program: &mut Program<'a>,
    options: &TranspileOptions,
) {
    SpecifierRewriter { ast, options }.visit_program(program);
}

struct SpecifierRewriter<'a, 'o> {
    ast: AstBuilder<'a>,
    options: &'o TranspileOptions,
}

impl<'a> SpecifierRewriter<'a, '_> {
    fn rewrite(&self, literal: &mut StringLiteral<'a>) {
        if let Some(mapped) = map_specifier(literal.value.as_str(), self.options) {
            literal.value = self.ast.atom(&mapped);
            literal.raw = None;
        }
    }
}

impl<'a> VisitMut<'a> for SpecifierRewriter<'a, '_> {
    fn visit_import_declaration(&mut self, it: &mut ImportDeclaration<'a>) {
        self.rewrite(&mut it.source);
    }

    fn visit_export_all_declaration(&mut self, it: &mut ExportAllDeclaration<'a>) {
        self.rewrite(&mut it.source);
    }

    fn visit_export_named_declaration(&mut self, it: &mut ExportNamedDeclaration<'a>) {
        if let Some(source) = &mut it.source {
            self.rewrite(source);
        }
        walk_mut::walk_export_named_declaration(self, it);
    }

    fn visit_import_expression(&mut self, it: &mut ImportExpression<'a>) {
        if let Expression::StringLiteral(literal) = &mut it.source {
            self.rewrite(literal);
        }
        walk_mut::walk_import_expression(self, it);
    }
}

fn map_specifier(specifier: &str, options: &TranspileOptions) -> Option<String> {
    let custom = options.jsx_import_source.as_str();
    let runtime = |module: &str| Some(options.runtime_url(module));

    match specifier {
        "react" | "react-dom" | "react-dom/client" | "0x1" => return runtime("index"),
        "react/jsx-runtime" | "0x1/jsx-runtime" => return runtime("jsx-runtime"),
        "react/jsx-dev-runtime" | "0x1/jsx-dev-runtime" => return runtime("jsx-dev-runtime"),
        _ => {}
    }

    if let Some(sub) = specifier.strip_prefix(custom).and_then(|s| s.strip_prefix('/')) {
        if matches!(sub, "jsx-runtime" | "jsx-dev-runtime") {
            return runtime(sub);
        }
    }

    if let Some(sub) = specifier.strip_prefix("0x1/") {
        return runtime(sub.trim_end_matches(".js"));
    }

    let relative = specifier.starts_with("./") || specifier.starts_with("../");
    if relative && !has_known_extension(specifier) {
        return Some(format!("{specifier}.js"));
    }

    None
}

fn has_known_extension(specifier: &str) -> bool {
    Path::new(specifier)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| KNOWN_EXTENSIONS.contains(&ext))
}

/// Script that injects each stylesheet as a `<style>` tag, once per href.
pub fn stylesheet_loader(hrefs: &[String]) -> String {
    if hrefs.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        r#"const __0x1_loadStyle = (href) => {
  if (document.querySelector(`style[data-0x1-href="${href}"]`)) return;
  const style = document.createElement("style");
  style.setAttribute("data-0x1-href", href);
  document.head.appendChild(style);
  fetch(href)
    .then((res) => (res.ok ? res.text() : ""))
    .then((css) => { style.textContent = css; })
    .catch((err) => console.warn("[0x1] failed to load stylesheet " + href, err));
};
"#,
    );

    for href in hrefs {
        let literal = serde_json::to_string(href).unwrap_or_else(|_| format!("\"{href}\""));
        out.push_str(&format!("__0x1_loadStyle({literal});\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_codegen::Codegen;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn options() -> TranspileOptions {
        TranspileOptions::new("/project")
    }

    fn rewrite(code: &str, options: &TranspileOptions) -> String {
        let allocator = Allocator::default();
        let mut program = Parser::new(&allocator, code, SourceType::mjs()).parse().program;
        rewrite_specifiers(AstBuilder::new(&allocator), &mut program, options);
        Codegen::new().build(&program).code
    }

    #[test]
    fn strips_plain_css_imports() {
        let source = "import \"../globals.css\";\nimport './local.css'\nexport default 1;\n";
        let result = extract_css_imports(source, "/app/pages/home.tsx");

        assert!(!result.code.contains(".css"));
        assert!(result.code.contains("export default 1;"));
        assert_eq!(result.stylesheets, vec!["/app/globals.css", "/app/pages/local.css"]);
    }

    #[test]
    fn rewrites_css_module_imports() {
        let source = "import styles from './button.module.css';\nimport { primary } from \"./theme.module.css\";";
        let result = extract_css_imports(source, "/components/button.tsx");

        assert!(result.code.contains("import styles from \"./button.module.css.js\";"));
        assert!(result.code.contains("import { primary } from \"./theme.module.css.js\";"));
        assert!(result.stylesheets.is_empty());
    }

    #[test]
    fn side_effect_module_import_is_loaded_as_stylesheet() {
        let result = extract_css_imports("import './a.module.css';", "/x.tsx");
        assert_eq!(result.stylesheets, vec!["/a.module.css"]);
    }

    #[test]
    fn duplicate_stylesheets_are_recorded_once() {
        let source = "import './a.css';\nimport \"./a.css\";";
        let result = extract_css_imports(source, "/x.tsx");
        assert_eq!(result.stylesheets.len(), 1);
    }

    #[test]
    fn bare_css_specifiers_resolve_to_node_modules() {
        let result = extract_css_imports("import 'some-lib/dist/styles.css';", "/x.tsx");
        assert_eq!(result.stylesheets, vec!["/node_modules/some-lib/dist/styles.css"]);
    }

    #[test]
    fn maps_react_specifiers_to_runtime() {
        let code = r#"import { useState } from "react";
import { jsxDEV } from "react/jsx-dev-runtime";
import { createRoot } from "react-dom/client";
import { Link } from "0x1/router";
"#;
        let out = rewrite(code, &options());

        assert!(out.contains(r#"from "/0x1/index.js""#));
        assert!(out.contains(r#"from "/0x1/jsx-dev-runtime.js""#));
        assert!(out.contains(r#"from "/0x1/router.js""#));
        assert!(!out.contains(r#""react""#));
    }

    #[test]
    fn appends_js_to_extensionless_relative_imports() {
        let code = r#"import Header from "./components/Header";
import data from "../data.json";
export * from "./utils";
const lazy = import("./Lazy");
"#;
        let out = rewrite(code, &options());

        assert!(out.contains(r#"from "./components/Header.js""#));
        assert!(out.contains(r#"from "../data.json""#));
        assert!(out.contains(r#"from "./utils.js""#));
        assert!(out.contains(r#"import("./Lazy.js")"#));
    }

    #[test]
    fn leaves_other_packages_alone() {
        let out = rewrite(r#"import dayjs from "dayjs";"#, &options());
        assert!(out.contains(r#"from "dayjs""#));
    }

    #[test]
    fn ignores_specifier_text_in_strings_and_comments() {
        let code = r#"// import a from "./commented"
const snippet = 'import b from "./quoted"';
const call = load("./plain");
export { snippet, call };
"#;
        let out = rewrite(code, &options());

        assert!(!out.contains("./quoted.js"));
        assert!(!out.contains("./plain.js"));
        assert!(!out.contains("./commented.js"));
        assert!(out.contains("./quoted"));
    }

    #[test]
    fn rewrites_imports_nested_in_exports() {
        let code = r#"export const page = () => import("./Page");"#;
        let out = rewrite(code, &options());
        assert!(out.contains(r#"import("./Page.js")"#));
    }

    #[test]
    fn custom_import_source_maps_to_runtime() {
        let opts = options().with_jsx_import_source("preact");
        let out = rewrite(r#"import { jsx } from "preact/jsx-runtime";"#, &opts);
        assert!(out.contains(r#"import { jsx } from "/0x1/jsx-runtime.js";"#));
    }

    #[test]
    fn loader_deduplicates_by_href() {
        let loader = stylesheet_loader(&["/app/globals.css".to_string()]);
        assert!(loader.contains("data-0x1-href"));
        assert!(loader.contains(r#"__0x1_loadStyle("/app/globals.css");"#));
        assert!(stylesheet_loader(&[]).is_empty());
    }
}
