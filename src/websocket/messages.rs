//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboard clients and the energy tracker server.

use serde::{Deserialize, Serialize};

use crate::dashboard::{
    ChartView, DashboardView, LogPeriod, TileView, ViewChange, ViewUpdate, LOAD_COUNT,
};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// List of topics to subscribe to (e.g., "relays", "charts.*")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe {
        /// List of topics to unsubscribe from
        topics: Vec<String>,
    },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Relay checkbox states
    Relays { states: [bool; LOAD_COUNT] },
    /// All four live tiles
    Tiles { tiles: Vec<TileView> },
    /// One appended notification
    Notification { text: String },
    /// One redrawn usage chart
    Chart { period: LogPeriod, chart: ChartView },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Topics successfully unsubscribed from
        topics: Vec<String>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

impl From<ViewUpdate> for ServerMessage {
    fn from(update: ViewUpdate) -> Self {
        match update {
            ViewUpdate::Relays { states } => ServerMessage::Relays { states },
            ViewUpdate::Tiles { tiles } => ServerMessage::Tiles { tiles },
            ViewUpdate::Notification { text } => ServerMessage::Notification { text },
            ViewUpdate::Chart { period, chart } => ServerMessage::Chart { period, chart },
        }
    }
}

/// A server message addressed to one topic
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "charts.daily")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
    /// View revision this event brings a client up to
    pub revision: u64,
}

impl WsEvent {
    pub fn new(revision: u64, update: ViewUpdate) -> Self {
        Self {
            topic: update.topic(),
            message: update.into(),
            revision,
        }
    }
}

impl From<ViewChange> for WsEvent {
    fn from(change: ViewChange) -> Self {
        Self::new(change.revision, change.update)
    }
}

impl WsEvent {
    /// Events that recreate `view` on a fresh client: relays, tiles, every
    /// notification so far, then the three usage charts
    pub fn snapshot(view: &DashboardView) -> Vec<WsEvent> {
        let mut updates = vec![
            ViewUpdate::Relays {
                states: view.relays,
            },
            ViewUpdate::Tiles {
                tiles: view.tiles.clone(),
            },
        ];
        updates.extend(
            view.notifications
                .iter()
                .map(|text| ViewUpdate::Notification { text: text.clone() }),
        );
        updates.extend(LogPeriod::ALL.into_iter().map(|period| ViewUpdate::Chart {
            period,
            chart: view.charts.get(period).clone(),
        }));

        updates
            .into_iter()
            .map(|update| WsEvent::new(view.revision, update))
            .collect()
    }
}

/// Whether a subscription `pattern` covers `topic`.
/// `charts.*` covers every `charts.<period>` topic.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    if pattern == topic {
        return true;
    }
    match pattern.strip_suffix(".*") {
        Some(prefix) => topic
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["relays", "charts.*"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => {
                assert_eq!(topics.len(), 2);
                assert_eq!(topics[0], "relays");
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_serialize_relays() {
        let msg = ServerMessage::Relays {
            states: [true, false, false, true],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"relays","states":[true,false,false,true]}"#);
    }

    #[test]
    fn test_server_message_serialize_chart() {
        let msg = ServerMessage::Chart {
            period: LogPeriod::Weekly,
            chart: ChartView::usage(LogPeriod::Weekly),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"chart\""));
        assert!(json.contains("\"period\":\"weekly\""));
        assert!(json.contains("\"title\":\"Weekly Usage (Wh)\""));
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            connection_id: "abc-123".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
    }

    #[test]
    fn test_ws_event_from_update() {
        let event = WsEvent::from(ViewChange {
            revision: 7,
            update: ViewUpdate::Notification {
                text: "Load 4 limit reached".to_string(),
            },
        });
        assert_eq!(event.topic, "notifications");
        assert_eq!(event.revision, 7);
        assert_eq!(
            event.message,
            ServerMessage::Notification {
                text: "Load 4 limit reached".to_string()
            }
        );
    }

    #[test]
    fn test_snapshot_events() {
        let mut view = DashboardView::default();
        view.notifications = vec!["a".to_string(), "b".to_string()];

        let topics: Vec<String> = WsEvent::snapshot(&view).into_iter().map(|e| e.topic).collect();
        assert_eq!(
            topics,
            vec![
                "relays",
                "loads",
                "notifications",
                "notifications",
                "charts.daily",
                "charts.weekly",
                "charts.monthly"
            ]
        );
    }

    #[test]
    fn test_topic_matches() {
        assert!(topic_matches("relays", "relays"));
        assert!(topic_matches("charts.*", "charts.daily"));
        assert!(!topic_matches("charts.*", "charts"));
        assert!(!topic_matches("charts.*", "chartsx.daily"));
        assert!(!topic_matches("charts.daily", "charts.weekly"));
    }
}
