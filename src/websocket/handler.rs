//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{topic_matches, ClientMessage, ServerMessage, WsEvent};
use crate::api::AppState;
use crate::dashboard::DashboardController;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.ws_hub);
    let controller = Arc::clone(&state.controller);
    ws.on_upgrade(move |socket| handle_socket(socket, hub, controller))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    hub: Arc<ConnectionHub>,
    controller: Arc<DashboardController>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            let error_msg = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Some(msg) = encode(&error_msg) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    let connected_msg = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    let sent = match encode(&connected_msg) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        tracing::error!(connection_id = %connection_id, "Failed to send connected message");
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();
    let heartbeat = hub.config().heartbeat_interval;

    // Forward queued messages to the socket and ping on an interval
    let mut send_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;

        loop {
            let outgoing = tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => encode(&msg),
                    None => break,
                },
                _ = ticker.tick() => Some(Message::Ping(Vec::new())),
            };

            let Some(outgoing) = outgoing else { continue };
            if sender.send(outgoing).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &controller, &conn_id_for_recv, msg).await
                    {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &ConnectionHub,
    controller: &DashboardController,
    connection_id: &str,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(hub, controller, connection_id, client_msg).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message
async fn handle_client_message(
    hub: &ConnectionHub,
    controller: &DashboardController,
    connection_id: &str,
    message: ClientMessage,
) {
    let response = match message {
        ClientMessage::Subscribe { topics } => {
            // The view stays put until the replay is queued, so live events
            // pick up exactly where the replay ends
            let view = controller.read_view().await;
            match hub.subscribe(connection_id, topics, view.revision).await {
                Ok(subscribed) => {
                    let _ = hub
                        .send_to(
                            connection_id,
                            ServerMessage::Subscribed {
                                topics: subscribed.clone(),
                            },
                        )
                        .await;

                    for event in WsEvent::snapshot(&view) {
                        if subscribed.iter().any(|t| topic_matches(t, &event.topic)) {
                            let _ = hub.send_to(connection_id, event.message).await;
                        }
                    }
                    return;
                }
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Subscribe error");
                    ServerMessage::Error {
                        message: e.to_string(),
                    }
                }
            }
        }
        ClientMessage::Unsubscribe { topics } => {
            match hub.unsubscribe(connection_id, topics).await {
                Ok(unsubscribed) => ServerMessage::Unsubscribed {
                    topics: unsubscribed,
                },
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Unsubscribe error");
                    ServerMessage::Error {
                        message: e.to_string(),
                    }
                }
            }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    };

    let _ = hub.send_to(connection_id, response).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardSettings;
    use crate::store::{MemoryStore, ObservableStore, StorePath};
    use crate::websocket::HubConfig;
    use serde_json::json;
    use std::time::Duration;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s).unwrap()
    }

    async fn connected() -> (
        ConnectionHub,
        DashboardController,
        String,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let hub = ConnectionHub::new(HubConfig::default());
        let controller = DashboardController::new(
            Arc::new(MemoryStore::in_memory()),
            DashboardSettings::default(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        (hub, controller, id, rx)
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (hub, controller, id, mut rx) = connected().await;

        let keep_open = handle_ws_message(
            &hub,
            &controller,
            &id,
            Message::Text(r#"{"type":"ping"}"#.to_string()),
        )
        .await;

        assert!(keep_open);
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::Pong);
    }

    #[tokio::test]
    async fn test_subscribe_sends_current_state() {
        let (hub, controller, id, mut rx) = connected().await;

        handle_client_message(
            &hub,
            &controller,
            &id,
            ClientMessage::Subscribe {
                topics: vec!["relays".to_string(), "charts.*".to_string()],
            },
        )
        .await;

        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Subscribed { .. })));
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerMessage::Relays { states: [false; 4] }
        );
        for _ in 0..3 {
            assert!(matches!(rx.try_recv(), Ok(ServerMessage::Chart { .. })));
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notification_during_subscribe_arrives_once() {
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let store = Arc::new(MemoryStore::in_memory());
        let controller = DashboardController::new(store.clone(), DashboardSettings::default());
        let bindings = controller.start().await.unwrap();
        let updates = controller.subscribe_updates();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        // The push lands in the view while its live event is still queued;
        // nothing forwards updates until after the subscribe
        store
            .push(&path("notifications"), json!({"load": 2, "type": "timer"}))
            .await
            .unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while controller.view().await.notifications.is_empty() {
            assert!(tokio::time::Instant::now() < deadline, "push never reached the view");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle_client_message(
            &hub,
            &controller,
            &id,
            ClientMessage::Subscribe {
                topics: vec!["notifications".to_string()],
            },
        )
        .await;
        let forwarder = Arc::clone(&hub).spawn_forwarder(updates);

        store
            .push(&path("notifications"), json!({"load": 3, "type": "limit"}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut received = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::Notification { text } = msg {
                received.push(text);
            }
        }
        assert_eq!(received.len(), 2, "got {:?}", received);
        assert_ne!(received[0], received[1]);

        bindings.abort();
        forwarder.abort();
    }

    #[tokio::test]
    async fn test_invalid_message_keeps_connection() {
        let (hub, controller, id, mut rx) = connected().await;

        let keep_open =
            handle_ws_message(&hub, &controller, &id, Message::Text("nonsense".to_string())).await;

        assert!(keep_open);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn test_close_ends_connection() {
        let (hub, controller, id, _rx) = connected().await;
        assert!(!handle_ws_message(&hub, &controller, &id, Message::Close(None)).await);
    }
}
