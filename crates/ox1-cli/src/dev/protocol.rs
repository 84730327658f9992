//! Live-reload wire protocol.
//!
//! Both transports carry JSON with a `type` tag. WebSocket messages are
//! answered and pushed as [`ServerMessage`]; SSE frames pair an event name
//! with an [`SsePayload`]. Client messages decode into the closed
//! [`ClientMessage`] enum, anything else is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A change the browser has to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    FullReload,
    /// Stylesheet at a project URL path (`/app/globals.css`) changed
    CssUpdate { path: String },
}

impl ReloadEvent {
    pub fn css(path: impl Into<String>) -> Self {
        ReloadEvent::CssUpdate { path: path.into() }
    }

    /// WebSocket rendition of the event.
    pub fn ws_message(&self, timestamp: i64) -> ServerMessage {
        match self {
            ReloadEvent::FullReload => ServerMessage::Reload { timestamp },
            ReloadEvent::CssUpdate { path } => ServerMessage::Css {
                path: path.clone(),
                timestamp,
            },
        }
    }

    /// SSE rendition of the event.
    pub fn sse_frame(&self, timestamp: i64) -> SseFrame {
        match self {
            ReloadEvent::FullReload => SseFrame::new("update", &SsePayload::Reload { timestamp }),
            ReloadEvent::CssUpdate { path } => SseFrame::new(
                "css-update",
                &SsePayload::CssUpdate {
                    path: path.clone(),
                    timestamp,
                },
            ),
        }
    }
}

/// Messages the server writes to a WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: Uuid,
    },
    Pong,
    Reload {
        timestamp: i64,
    },
    Css {
        path: String,
        timestamp: i64,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        // Only strings, integers and UUIDs: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Data carried by SSE frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SsePayload {
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: Uuid,
        timestamp: i64,
    },
    Reload {
        timestamp: i64,
    },
    CssUpdate {
        path: String,
        timestamp: i64,
    },
}

/// One server-sent event: name plus JSON data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: &'static str,
    pub data: String,
}

impl SseFrame {
    pub fn new(event: &'static str, payload: &SsePayload) -> Self {
        Self {
            event,
            data: serde_json::to_string(payload).unwrap_or_default(),
        }
    }

    pub fn connected(connection_id: Uuid, timestamp: i64) -> Self {
        Self::new(
            "connected",
            &SsePayload::Connected {
                connection_id,
                timestamp,
            },
        )
    }

    pub fn ping() -> Self {
        Self {
            event: "ping",
            data: String::new(),
        }
    }

    pub fn into_event(self) -> axum::response::sse::Event {
        axum::response::sse::Event::default()
            .event(self.event)
            .data(self.data)
    }
}

/// Messages a browser may send over the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Ping,
    Pong,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized client message: {0}")]
    Unrecognized(#[source] serde_json::Error),
}

/// Decode a client message at the transport boundary.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Unrecognized)
}

/// What the server answers to an inbound WebSocket text frame, if anything.
pub fn reply_to(text: &str) -> Option<ServerMessage> {
    match parse_client_message(text) {
        Ok(ClientMessage::Ping) => Some(ServerMessage::Pong),
        Ok(ClientMessage::Pong) => None,
        Err(err) => Some(ServerMessage::Error {
            message: err.to_string(),
        }),
    }
}

/// Milliseconds since the Unix epoch, as sent in every event.
pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn ws_messages_match_the_browser_client() {
        let id = Uuid::nil();
        assert_eq!(
            parse(&ServerMessage::Connected { connection_id: id }.to_json()),
            json!({"type": "connected", "connectionId": id.to_string()})
        );
        assert_eq!(parse(&ServerMessage::Pong.to_json()), json!({"type": "pong"}));
        assert_eq!(
            parse(&ReloadEvent::FullReload.ws_message(7).to_json()),
            json!({"type": "reload", "timestamp": 7})
        );
        assert_eq!(
            parse(&ReloadEvent::css("/app/globals.css").ws_message(7).to_json()),
            json!({"type": "css", "path": "/app/globals.css", "timestamp": 7})
        );
    }

    #[test]
    fn sse_frames_use_named_events() {
        let frame = ReloadEvent::FullReload.sse_frame(1);
        assert_eq!(frame.event, "update");
        assert_eq!(parse(&frame.data), json!({"type": "reload", "timestamp": 1}));

        let frame = ReloadEvent::css("/styles/globals.css").sse_frame(2);
        assert_eq!(frame.event, "css-update");
        assert_eq!(
            parse(&frame.data),
            json!({"type": "css-update", "path": "/styles/globals.css", "timestamp": 2})
        );

        let frame = SseFrame::connected(Uuid::nil(), 3);
        assert_eq!(frame.event, "connected");
        assert_eq!(parse(&frame.data)["connectionId"], json!(Uuid::nil().to_string()));
    }

    #[test]
    fn client_messages_are_a_closed_set() {
        assert_eq!(parse_client_message(r#"{"type":"ping"}"#).unwrap(), ClientMessage::Ping);
        assert_eq!(
            parse_client_message(r#"{"type":"ping","timestamp":123}"#).unwrap(),
            ClientMessage::Ping
        );
        assert!(parse_client_message(r#"{"type":"reload"}"#).is_err());
        assert!(parse_client_message(r#"{"kind":"ping"}"#).is_err());
        assert!(parse_client_message("ping").is_err());
    }

    #[test]
    fn replies() {
        assert_eq!(reply_to(r#"{"type":"ping"}"#), Some(ServerMessage::Pong));
        assert_eq!(reply_to(r#"{"type":"pong"}"#), None);
        assert!(matches!(reply_to("{}"), Some(ServerMessage::Error { .. })));
    }
}
