//! Fan-out of reload events to connected browsers.
//!
//! Every browser tab holds one connection, either a WebSocket or an SSE
//! stream. The socket/stream task owns the receiving half of a bounded
//! channel; the broadcaster keeps the sending half per client id.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::dev::protocol::{ReloadEvent, SseFrame, timestamp};

/// Frames buffered per client before sends are skipped.
pub const CLIENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    WebSocket,
    Sse,
}

/// Sending half of a client's channel.
#[derive(Debug, Clone)]
pub enum ClientHandle {
    /// JSON text frames
    WebSocket(mpsc::Sender<String>),
    Sse(mpsc::Sender<SseFrame>),
}

impl ClientHandle {
    pub fn transport(&self) -> Transport {
        match self {
            ClientHandle::WebSocket(_) => Transport::WebSocket,
            ClientHandle::Sse(_) => Transport::Sse,
        }
    }
}

#[derive(Debug)]
struct ClientConnection {
    handle: ClientHandle,
    last_active: Instant,
}

/// Outcome of one [`Broadcaster::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Clients dropped because their channel was closed
    pub removed: usize,
    /// Clients skipped because their buffer was full
    pub skipped: usize,
}

enum Delivery {
    Sent,
    Full,
    Closed,
}

fn deliver<T>(tx: &mpsc::Sender<T>, msg: T) -> Delivery {
    match tx.try_send(msg) {
        Ok(()) => Delivery::Sent,
        Err(TrySendError::Full(_)) => Delivery::Full,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
}

/// Connection sets for both live-reload transports.
#[derive(Debug, Default)]
pub struct Broadcaster {
    websocket: RwLock<HashMap<Uuid, ClientConnection>>,
    sse: RwLock<HashMap<Uuid, ClientConnection>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self, transport: Transport) -> &RwLock<HashMap<Uuid, ClientConnection>> {
        match transport {
            Transport::WebSocket => &self.websocket,
            Transport::Sse => &self.sse,
        }
    }

    /// Add a client to the set for its transport.
    pub fn register_client(&self, handle: ClientHandle) -> Uuid {
        let id = Uuid::new_v4();
        let transport = handle.transport();
        self.clients(transport).write().insert(
            id,
            ClientConnection {
                handle,
                last_active: Instant::now(),
            },
        );
        tracing::debug!(%id, ?transport, "live reload client connected");
        id
    }

    /// Register a WebSocket client and return the receiving end of its channel.
    pub fn connect_websocket(&self) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        (self.register_client(ClientHandle::WebSocket(tx)), rx)
    }

    /// Register an SSE client and return the receiving end of its channel.
    pub fn connect_sse(&self) -> (Uuid, mpsc::Receiver<SseFrame>) {
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        (self.register_client(ClientHandle::Sse(tx)), rx)
    }

    /// Remove a client. Returns whether it was still registered.
    pub fn unregister_client(&self, transport: Transport, id: Uuid) -> bool {
        let removed = self.clients(transport).write().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, ?transport, "live reload client disconnected");
        }
        removed
    }

    /// Send `event` to every client, at most once each.
    pub fn broadcast(&self, event: &ReloadEvent) -> BroadcastReport {
        let now = timestamp();
        let ws_text = event.ws_message(now).to_json();
        let sse_frame = event.sse_frame(now);

        let mut report = BroadcastReport::default();
        for transport in [Transport::WebSocket, Transport::Sse] {
            let mut clients = self.clients(transport).write();
            clients.retain(|id, client| {
                let delivery = match &client.handle {
                    ClientHandle::WebSocket(tx) => deliver(tx, ws_text.clone()),
                    ClientHandle::Sse(tx) => deliver(tx, sse_frame.clone()),
                };
                match delivery {
                    Delivery::Sent => {
                        report.delivered += 1;
                        true
                    }
                    Delivery::Full => {
                        tracing::warn!(%id, ?transport, "client buffer full, skipping reload event");
                        report.skipped += 1;
                        true
                    }
                    Delivery::Closed => {
                        tracing::debug!(%id, ?transport, "removing closed client");
                        report.removed += 1;
                        false
                    }
                }
            });
        }

        tracing::debug!(?event, ?report, "broadcast reload event");
        report
    }

    /// Send an SSE `ping` to every SSE client, refreshing the ones that took it.
    pub fn heartbeat(&self) -> BroadcastReport {
        let now = Instant::now();
        let mut report = BroadcastReport::default();
        self.sse.write().retain(|_, client| {
            let ClientHandle::Sse(tx) = &client.handle else {
                return true;
            };
            match deliver(tx, SseFrame::ping()) {
                Delivery::Sent => {
                    client.last_active = now;
                    report.delivered += 1;
                    true
                }
                Delivery::Full => {
                    report.skipped += 1;
                    true
                }
                Delivery::Closed => {
                    report.removed += 1;
                    false
                }
            }
        });
        report
    }

    /// Mark a client as active, e.g. after inbound WebSocket traffic.
    pub fn touch(&self, transport: Transport, id: Uuid) {
        if let Some(client) = self.clients(transport).write().get_mut(&id) {
            client.last_active = Instant::now();
        }
    }

    /// Drop SSE clients idle for longer than `max_age`. Returns how many went.
    pub fn cleanup_inactive_clients(&self, max_age: Duration) -> usize {
        let mut clients = self.sse.write();
        let before = clients.len();
        clients.retain(|_, client| client.last_active.elapsed() <= max_age);
        let removed = before - clients.len();
        if removed > 0 {
            tracing::debug!(removed, "reaped inactive SSE clients");
        }
        removed
    }

    pub fn client_count(&self, transport: Transport) -> usize {
        self.clients(transport).read().len()
    }

    pub fn total_clients(&self) -> usize {
        self.websocket.read().len() + self.sse.read().len()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, transport: Transport, id: Uuid, by: Duration) {
        if let Some(client) = self.clients(transport).write().get_mut(&id) {
            if let Some(earlier) = client.last_active.checked_sub(by) {
                client.last_active = earlier;
            }
        }
    }
}
