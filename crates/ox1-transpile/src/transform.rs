//! The OXC pass: parse, strip TypeScript, lower JSX, apply development defines.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use oxc_transformer_plugins::{ReplaceGlobalDefines, ReplaceGlobalDefinesConfig};

use crate::error::{Result, TranspileError};
use crate::imports::{extract_css_imports, rewrite_specifiers, stylesheet_loader};
use crate::options::TranspileOptions;

/// Extensions the transpiler accepts.
pub const TRANSPILABLE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts"];

const DEV_DEFINES: &[(&str, &str)] = &[("process.env.NODE_ENV", "\"development\"")];

pub fn is_transpilable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TRANSPILABLE_EXTENSIONS.contains(&ext))
}

/// Transpile one component source into a browser ES module.
///
/// `path` selects the dialect (TS, TSX, JSX) and is used in diagnostics;
/// `module_url` is the URL the result is served under, used to resolve
/// relative stylesheet imports.
pub fn transpile_source(
    path: &Path,
    source: &str,
    module_url: &str,
    options: &TranspileOptions,
) -> Result<String> {
    if !is_transpilable(path) {
        return Err(TranspileError::Unsupported(path.to_path_buf()));
    }

    let css = extract_css_imports(source, module_url);
    let code = compile(path, &css.code, options)?;

    if css.stylesheets.is_empty() {
        Ok(code)
    } else {
        Ok(format!("{}{code}", stylesheet_loader(&css.stylesheets)))
    }
}

fn compile(path: &Path, source: &str, options: &TranspileOptions) -> Result<String> {
    let allocator = Allocator::default();

    let source_type = SourceType::from_path(path)
        .map_err(|e| TranspileError::internal(path, e.to_string()))?;

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        let messages = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(TranspileError::syntax(path, messages));
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let mut transform_options = TransformOptions::from_target(&options.target)
        .map_err(|e| TranspileError::internal(path, e))?;
    transform_options.jsx = JsxOptions {
        runtime: JsxRuntime::Automatic,
        development: true,
        import_source: Some(options.jsx_import_source.clone()),
        ..JsxOptions::default()
    };

    let transformed = Transformer::new(&allocator, path, &transform_options)
        .build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        let messages = transformed.errors.iter().map(|e| e.to_string()).collect();
        return Err(TranspileError::syntax(path, messages));
    }

    let defines = ReplaceGlobalDefinesConfig::new(DEV_DEFINES).map_err(|errors| {
        let joined = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>();
        TranspileError::internal(path, joined.join(", "))
    })?;
    ReplaceGlobalDefines::new(&allocator, defines).build(transformed.scoping, &mut program);
    rewrite_specifiers(AstBuilder::new(&allocator), &mut program, options);

    Ok(Codegen::new().build(&program).code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options() -> TranspileOptions {
        TranspileOptions::new("/project")
    }

    fn transpile(name: &str, source: &str) -> Result<String> {
        let path = PathBuf::from("/project/app").join(name);
        transpile_source(&path, source, &format!("/app/{name}"), &options())
    }

    #[test]
    fn lowers_tsx_to_runtime_imports() {
        let source = r#"
import { useState } from "react";
import Header from "./Header";

interface Props { title: string }

export default function Page({ title }: Props) {
  const [n, setN] = useState<number>(0);
  return <main><Header />{title}{n}</main>;
}
"#;
        let out = transpile("page.tsx", source).unwrap();

        assert!(!out.contains("interface Props"));
        assert!(!out.contains("<main>"));
        assert!(out.contains("/0x1/jsx-dev-runtime.js"));
        assert!(out.contains("/0x1/index.js"));
        assert!(out.contains("./Header.js"));
    }

    #[test]
    fn replaces_node_env() {
        let out = transpile("env.ts", "export const dev = process.env.NODE_ENV;").unwrap();
        assert!(out.contains("\"development\""));
        assert!(!out.contains("process.env"));
    }

    #[test]
    fn prepends_stylesheet_loader() {
        let source = "import \"./globals.css\";\nexport default () => <div />;\n";
        let out = transpile("layout.jsx", source).unwrap();

        assert!(out.starts_with("const __0x1_loadStyle"));
        assert!(out.contains(r#"__0x1_loadStyle("/app/globals.css")"#));
    }

    #[test]
    fn syntax_errors_are_typed() {
        let err = transpile("broken.tsx", "export default () => <div>;").unwrap_err();
        assert!(matches!(err, TranspileError::Syntax { .. }));
        assert!(err.wants_fallback());
    }

    #[test]
    fn rejects_other_extensions() {
        let err = transpile_source(Path::new("a.vue"), "", "/a.vue", &options()).unwrap_err();
        assert!(matches!(err, TranspileError::Unsupported(_)));
        assert!(!err.wants_fallback());
    }

    #[test]
    fn recognizes_transpilable_paths() {
        assert!(is_transpilable(Path::new("a/b.tsx")));
        assert!(is_transpilable(Path::new("b.ts")));
        assert!(is_transpilable(Path::new("b.jsx")));
        assert!(!is_transpilable(Path::new("b.js")));
        assert!(!is_transpilable(Path::new("b.css")));
    }
}
