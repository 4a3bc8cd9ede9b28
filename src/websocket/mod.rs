//! WebSocket Real-Time Streaming
//!
//! Pushes dashboard view updates to connected clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/api/v1/ws` and can subscribe to topics:
//! - `relays` - Relay checkbox states
//! - `loads` - Live telemetry tiles
//! - `notifications` - Appended notifications
//! - `charts.{daily,weekly,monthly}` - One usage chart
//! - `charts.*` - All usage charts
//!
//! Subscribing also delivers the current state of each subscribed topic.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8090/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['relays', 'loads']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{topic_matches, ClientMessage, ServerMessage, WsEvent};
