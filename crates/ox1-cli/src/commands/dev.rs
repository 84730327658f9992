//! `ox1 dev` - development server lifecycle.
//!
//! 1. Load configuration and pick a port
//! 2. Process Tailwind CSS once
//! 3. Start the file watcher and the HTTP server
//! 4. Dispatch file changes to the browsers until Ctrl+C

use std::path::Path;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;

use crate::cli::DevArgs;
use crate::dev::{DevConfig, DevServer, DevState, FileChange, FileWatcher, ReloadEvent, SharedState};
use crate::error::Result;
use crate::ui;

/// Execute the dev command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a busy port range, watcher
/// setup failures and server startup failures.
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let config = DevConfig::from_args(&args)?;
    ui::info(&format!("Project root: {}", config.root.display()));

    let state = DevState::new(config.clone()).shared();

    if let Some(tailwind) = &state.tailwind {
        match tailwind.stylesheet_url().await {
            Some(url) => {
                ui::info(&format!("Processing Tailwind CSS ({})...", url));
                if tailwind.process_tailwind_css().await {
                    ui::success("Tailwind CSS ready");
                } else {
                    ui::warning("Tailwind CSS processing failed; serving the placeholder until the next change");
                }
            }
            None => ui::info("No global stylesheet found, Tailwind CSS disabled"),
        }
    }

    let dev = &config.settings.dev;
    let (watcher, mut change_rx) =
        FileWatcher::new(config.root.clone(), dev.ignore.clone(), dev.debounce_ms)?;
    ui::info(&format!("Watching for changes in: {}", watcher.root().display()));

    let background = spawn_background_tasks(&state);

    let server = DevServer::new(state.clone());
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            ui::error(&e.to_string());
        }
    });

    if dev.open {
        open_browser(&config.server_url());
    }

    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                handle_file_change(change, &state).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                break;
            }

            _ = &mut server_handle => {
                ui::warning("Server task completed unexpectedly");
                break;
            }
        }
    }

    for task in background {
        task.abort();
    }
    server_handle.abort();
    drop(watcher);

    ui::success("Development server stopped");
    Ok(())
}

/// SSE sweep, SSE heartbeat and the Tailwind stylesheet check.
fn spawn_background_tasks(state: &SharedState) -> Vec<JoinHandle<()>> {
    let config = &state.config;
    let mut tasks = vec![
        spawn_every(config.sweep_interval(), {
            let state = state.clone();
            move || {
                state.broadcaster.cleanup_inactive_clients(state.config.sse_max_age());
            }
        }),
        spawn_every(config.heartbeat_interval(), {
            let state = state.clone();
            move || {
                state.broadcaster.heartbeat();
            }
        }),
    ];

    if let Some(tailwind) = &state.tailwind {
        let interval = Duration::from_millis(config.settings.tailwind.check_interval_ms.max(100));
        tasks.push(tailwind.spawn_periodic_check(interval));
    }

    tasks
}

fn spawn_every(period: Duration, mut tick: impl FnMut() + Send + 'static) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tick();
        }
    })
}

async fn handle_file_change(change: FileChange, state: &SharedState) {
    let label = display_path(&state.config.root, change.path());
    let (event, report) = state.handle_change(&change).await;

    let action = match event {
        ReloadEvent::FullReload => "reload",
        ReloadEvent::CssUpdate { .. } => "css update",
    };
    ui::info(&format!(
        "{} changed, sent {} to {} client(s)",
        label, action, report.delivered
    ));
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Open the server URL in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}
