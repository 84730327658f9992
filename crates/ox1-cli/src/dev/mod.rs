//! Development server.
//!
//! - [`watcher`] - debounced project watcher
//! - [`broadcaster`] - WebSocket and SSE client sets
//! - [`protocol`] - live-reload wire format
//! - [`resolver`] - MIME types and safe static paths
//! - [`server`] - the axum app

pub mod broadcaster;
pub mod config;
pub mod protocol;
pub mod resolver;
pub mod server;
pub mod state;
pub mod watcher;

pub use broadcaster::{BroadcastReport, Broadcaster, ClientHandle, Transport};
pub use config::DevConfig;
pub use protocol::{ClientMessage, ReloadEvent, ServerMessage, SseFrame};
pub use server::DevServer;
pub use state::{DevState, SharedState};
pub use watcher::{FileChange, FileWatcher};
