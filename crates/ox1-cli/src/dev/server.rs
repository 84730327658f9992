//! Development HTTP server.
//!
//! Serves live-reload endpoints (SSE and WebSocket), transpiled components,
//! CSS modules, Tailwind output, the framework runtime and static files.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{
        Path as UrlPath, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::Event,
    },
    routing::get,
};
use ox1_transpile::{JS_CONTENT_TYPE, NO_CACHE, TranspileError, is_transpilable};
use tokio::net::TcpListener;
use tokio_stream::Stream;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::dev::broadcaster::{Broadcaster, Transport};
use crate::dev::protocol::{ServerMessage, SseFrame, reply_to, timestamp};
use crate::dev::resolver::{is_route, mime_type, resolve_file, sanitize, source_candidates};
use crate::dev::state::SharedState;
use crate::error::{CliError, Result};

pub const SSE_PATH: &str = "/__0x1_live_reload";
pub const SSE_ALIAS_PATH: &str = "/__0x1_sse_live_reload";
pub const WS_PATH: &str = "/__0x1_ws_live_reload";
pub const SCRIPT_PATH: &str = "/__0x1_live_reload.js";

const RELOAD_SCRIPT: &str = include_str!("../../assets/dev/live-reload.js");
const SCRIPT_TAG: &str = r#"<script src="/__0x1_live_reload.js"></script>"#;

/// Development server.
pub struct DevServer {
    state: SharedState,
}

impl DevServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Bind the configured address and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or the server fails.
    pub async fn start(self) -> Result<()> {
        let addr = self.state.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        crate::ui::server_ready(&self.state.config.server_url(), &[WS_PATH, SSE_PATH]);
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }

    /// The axum router with every dev route.
    pub fn router(&self) -> Router {
        let runtime_route = format!(
            "{}/{{*path}}",
            self.state.config.settings.runtime.url_prefix.trim_end_matches('/')
        );

        Router::new()
            .route(SSE_PATH, get(handle_sse))
            .route(SSE_ALIAS_PATH, get(handle_sse))
            .route(WS_PATH, get(handle_ws))
            .route(SCRIPT_PATH, get(handle_reload_script))
            .route(&runtime_route, get(handle_runtime))
            .route("/favicon.ico", get(handle_favicon))
            .fallback(handle_request)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(Arc::clone(&self.state))
    }
}

/// Unregisters an SSE client when its stream is dropped.
struct SseGuard {
    broadcaster: Arc<Broadcaster>,
    id: Uuid,
}

impl Drop for SseGuard {
    fn drop(&mut self) {
        self.broadcaster.unregister_client(Transport::Sse, self.id);
    }
}

async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, mut rx) = state.broadcaster.connect_sse();
    let guard = SseGuard {
        broadcaster: Arc::clone(&state.broadcaster),
        id,
    };
    let hello = SseFrame::connected(id, timestamp());

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok(hello.into_event());
        while let Some(frame) = rx.recv().await {
            yield Ok(frame.into_event());
        }
    };

    Sse::new(stream)
}

async fn handle_ws(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_session(socket, state))
}

async fn websocket_session(mut socket: WebSocket, state: SharedState) {
    let broadcaster = &state.broadcaster;
    let (id, mut rx) = broadcaster.connect_websocket();

    let hello = ServerMessage::Connected { connection_id: id }.to_json();
    if socket.send(Message::Text(hello.into())).await.is_ok() {
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(text) = frame else { break };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            broadcaster.touch(Transport::WebSocket, id);
                            if let Some(reply) = reply_to(text.as_str()) {
                                if socket.send(Message::Text(reply.to_json().into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => broadcaster.touch(Transport::WebSocket, id),
                    }
                }
            }
        }
    }

    broadcaster.unregister_client(Transport::WebSocket, id);
}

async fn handle_reload_script() -> Response {
    respond(JS_CONTENT_TYPE, RELOAD_SCRIPT)
}

/// Favicon from the project if there is one, 204 otherwise.
async fn handle_favicon(State(state): State<SharedState>) -> Response {
    match find_static(&state, "/favicon.ico").await {
        Some(path) => serve_file(&path).await,
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Framework runtime modules from the installed package.
async fn handle_runtime(State(state): State<SharedState>, UrlPath(path): UrlPath<String>) -> Response {
    let dir = state.config.runtime_dir();
    let mut found = resolve_file(&dir, &path).await;
    if found.is_none() && Path::new(&path).extension().is_none() {
        found = resolve_file(&dir, &format!("{path}.js")).await;
    }

    match found {
        Some(file) => serve_file(&file).await,
        None => not_found(&format!(
            "Runtime module not found: {path}\n\nHint: install the 0x1 package ({})",
            dir.display()
        )),
    }
}

/// Everything that is not a fixed route.
async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let path = uri.path();

    if let Some(tailwind) = &state.tailwind {
        if tailwind.is_tailwind_stylesheet(path).await {
            if tailwind.current().is_none() {
                tailwind.process_tailwind_css().await;
            }
            return respond("text/css; charset=utf-8", tailwind.get_processed_tailwind_css().to_string());
        }
    }

    let Some(relative) = sanitize(path) else {
        tracing::warn!(path, "rejected request path");
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };
    let root = &state.config.root;
    let name = relative.to_string_lossy();

    if let Some(css) = name.strip_suffix(".module.css.js") {
        return match resolve_file(root, &format!("{css}.module.css")).await {
            Some(source) => serve_module(state.transpiler.css_module_script(&source).await, path),
            None => not_found(path),
        };
    }

    if name.ends_with(".module.css") {
        return match resolve_file(root, path).await {
            Some(source) => serve_module(state.transpiler.scoped_css(&source).await, path),
            None => not_found(path),
        };
    }

    if is_transpilable(&relative) {
        return match resolve_file(root, path).await {
            Some(source) => serve_component(&state, &source).await,
            None => not_found(path),
        };
    }

    if let Some(file) = find_static(&state, path).await {
        return serve_file(&file).await;
    }

    if relative.extension().is_some_and(|ext| ext == "js") {
        for candidate in source_candidates(&relative) {
            if let Some(source) = resolve_file(root, &candidate.to_string_lossy()).await {
                return serve_component(&state, &source).await;
            }
        }
    }

    if is_route(path) {
        return serve_index(&state).await;
    }

    not_found(path)
}

/// `public/` first, then the project root.
async fn find_static(state: &SharedState, path: &str) -> Option<PathBuf> {
    match resolve_file(&state.config.public_dir(), path).await {
        Some(file) => Some(file),
        None => resolve_file(&state.config.root, path).await,
    }
}

async fn serve_component(state: &SharedState, source: &Path) -> Response {
    match state.transpiler.get_or_transpile(source).await {
        Ok(module) => respond(module.content_type, module.content.to_string()),
        Err(err) if err.wants_fallback() => {
            tracing::warn!(path = %source.display(), error = %err, "serving fallback component");
            crate::ui::error(&err.to_string());
            respond(JS_CONTENT_TYPE, state.transpiler.fallback(source, &err))
        }
        Err(err) => not_found(&err.to_string()),
    }
}

fn serve_module(result: std::result::Result<ox1_transpile::CachedModule, TranspileError>, path: &str) -> Response {
    match result {
        Ok(module) => respond(module.content_type, module.content.to_string()),
        Err(TranspileError::NotFound(_)) => not_found(path),
        Err(err) => {
            tracing::warn!(path, error = %err, "css module failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(content) => {
            let content_type = mime_type(path);
            if content_type.starts_with("text/html") {
                respond(content_type, inject_reload_script(&content, content_type))
            } else {
                respond(content_type, content)
            }
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read file");
            not_found(&path.display().to_string())
        }
    }
}

/// Project `index.html` with the reload script, or a generated shell.
async fn serve_index(state: &SharedState) -> Response {
    let candidates = [state.config.public_dir().join("index.html"), state.config.root.join("index.html")];
    for candidate in candidates {
        if let Ok(content) = tokio::fs::read(&candidate).await {
            let html = inject_reload_script(&content, "text/html");
            return respond("text/html; charset=utf-8", html);
        }
    }

    let stylesheet = match &state.tailwind {
        Some(tailwind) => tailwind.stylesheet_url().await,
        None => None,
    };
    let html = generate_index_html(
        &entry_url(&state.config.settings.dev.entry),
        &state.config.settings.runtime.module_url("index"),
        &state.config.settings.runtime.module_url("jsx-runtime"),
        stylesheet.as_deref(),
    );
    respond("text/html; charset=utf-8", html)
}

fn entry_url(entry: &str) -> String {
    format!("/{}", entry.trim_start_matches("./").trim_start_matches('/'))
}

/// Inject the reload script before the last `</body>`, or append it.
pub fn inject_reload_script(content: &[u8], content_type: &str) -> Vec<u8> {
    if !content_type.starts_with("text/html") {
        return content.to_vec();
    }

    let html = String::from_utf8_lossy(content);

    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + SCRIPT_TAG.len() + 4);
        result.push_str(&html[..pos]);
        result.push_str("  ");
        result.push_str(SCRIPT_TAG);
        result.push('\n');
        result.push_str(&html[pos..]);
        return result.into_bytes();
    }

    let mut result = html.into_owned();
    result.push('\n');
    result.push_str(SCRIPT_TAG);
    result.into_bytes()
}

/// HTML shell that mounts `entry` with the framework runtime.
pub fn generate_index_html(
    entry: &str,
    runtime: &str,
    jsx_runtime: &str,
    stylesheet: Option<&str>,
) -> String {
    let stylesheet = stylesheet
        .map(|href| format!("\n    <link rel=\"stylesheet\" href=\"{href}\" />"))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>0x1</title>{stylesheet}
  </head>
  <body>
    <div id="app"></div>
    <script type="module">
      import {{ jsx }} from "{jsx_runtime}";
      import * as runtime from "{runtime}";
      import Page from "{entry}";

      const mount = runtime.render ?? runtime.default?.render;
      const root = document.getElementById("app");
      if (mount) {{
        mount(jsx(Page, {{}}), root);
      }} else {{
        console.error("[0x1] runtime does not export render()");
      }}
    </script>
    {SCRIPT_TAG}
  </body>
</html>
"#
    )
}

fn respond(content_type: &str, body: impl Into<Body>) -> Response {
    (
        [(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, NO_CACHE)],
        body.into(),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("File not found: {}", what),
    )
        .into_response()
}
