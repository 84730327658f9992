use crate::options::TranspileOptions;

/// JS module served in place of a component that failed to compile.
///
/// The default export renders a visible error box and the failure is logged
/// to the browser console, so the rest of the page keeps working.
pub fn fallback_component(module: &str, message: &str, options: &TranspileOptions) -> String {
    let module_literal = serde_json::to_string(module).unwrap_or_else(|_| "\"<unknown>\"".into());
    let message_literal = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".into());
    let runtime = options.runtime_url("jsx-runtime");

    format!(
        r##"import {{ jsx, jsxs }} from "{runtime}";

const file = {module_literal};
const message = {message_literal};

console.error("[0x1] Failed to compile " + file + "\n" + message);

export default function CompileError() {{
  return jsxs("div", {{
    "data-0x1-error": file,
    style: {{
      padding: "1rem",
      margin: "1rem",
      border: "2px solid #ef4444",
      borderRadius: "0.5rem",
      background: "#fef2f2",
      color: "#991b1b",
      fontFamily: "ui-monospace, monospace",
    }},
    children: [
      jsx("strong", {{ children: "Failed to compile " + file }}),
      jsx("pre", {{ style: {{ whiteSpace: "pre-wrap" }}, children: message }}),
    ],
  }});
}}
"##
    )
}
