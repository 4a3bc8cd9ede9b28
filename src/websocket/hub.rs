//! WebSocket Connection Hub
//!
//! Manages all WebSocket connections, subscriptions, and message broadcasting.
//! View updates from the dashboard controller arrive on a tokio broadcast
//! channel and are fanned out to the connections subscribed to their topic.
//!
//! Lock order is `connections` then `subscriptions`, everywhere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::messages::{topic_matches, ServerMessage, WsEvent};
use crate::dashboard::ViewChange;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Topics a client may subscribe to
const TOPICS: &[&str] = &[
    "relays",
    "loads",
    "notifications",
    "charts.*",
    "charts.daily",
    "charts.weekly",
    "charts.monthly",
];

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Interval between server pings
    pub heartbeat_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Topics this connection is subscribed to, each with the view revision
    /// its snapshot was replayed at. Live events at or below it are stale.
    pub subscriptions: HashMap<String, u64>,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashMap::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions.into_keys() {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics. Unknown topics are skipped.
    ///
    /// `replayed_through` is the view revision the caller replays to the
    /// client for these topics; live events up to it are not delivered.
    pub async fn subscribe(
        &self,
        id: &str,
        topics: Vec<String>,
        replayed_through: u64,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone(), replayed_through);
            subs.entry(topic.clone())
                .or_default()
                .insert(id.to_string());

            subscribed.push(topic);
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?subscribed,
            "Subscribed to topics"
        );

        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic).is_some() {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?unsubscribed,
            "Unsubscribed from topics"
        );

        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic, exact or wildcard,
    /// unless that subscriber's replay already covered it. Returns how many
    /// connections it reached.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let connections = self.connections.read().await;
        let subs = self.subscriptions.read().await;

        let direct = subs.get(&event.topic);
        let wildcard = event
            .topic
            .split_once('.')
            .and_then(|(prefix, _)| subs.get(&format!("{}.*", prefix)));

        let all_ids: HashSet<&ConnectionId> = direct
            .into_iter()
            .chain(wildcard)
            .flat_map(|ids| ids.iter())
            .collect();

        let mut sent_count = 0;
        for id in all_ids {
            let Some(handle) = connections.get(id) else { continue };

            let replayed = handle
                .subscriptions
                .iter()
                .filter(|(pattern, _)| topic_matches(pattern, &event.topic))
                .map(|(_, revision)| *revision)
                .max()
                .unwrap_or(0);
            if event.revision <= replayed {
                continue;
            }

            if handle.sender.send(event.message.clone()).is_ok() {
                sent_count += 1;
            }
        }

        if sent_count > 0 {
            tracing::trace!(
                topic = %event.topic,
                subscribers = sent_count,
                "Broadcast event"
            );
        }
        sent_count
    }

    /// Forward every view update from `updates` to subscribers until the
    /// channel closes
    pub fn spawn_forwarder(
        self: Arc<Self>,
        mut updates: broadcast::Receiver<ViewChange>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(change) => {
                        self.broadcast(&WsEvent::from(change)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket forwarder lagged behind view updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("WebSocket forwarder stopped");
        })
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(
        &self,
        id: &str,
        message: ServerMessage,
    ) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get subscription count for a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

fn is_valid_topic(topic: &str) -> bool {
    TOPICS.contains(&topic)
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
