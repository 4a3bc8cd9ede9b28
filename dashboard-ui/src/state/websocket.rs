//! WebSocket Client
//!
//! Live view updates from the energy tracker API.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::{Chart, GlobalState, Tile, LOAD_COUNT};

/// Topics the dashboard page listens to
pub const DASHBOARD_TOPICS: [&str; 4] = ["relays", "loads", "notifications", "charts.*"];

const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket message types from server
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Connected {
        connection_id: String,
    },
    Relays {
        states: [bool; LOAD_COUNT],
    },
    Tiles {
        tiles: Vec<Tile>,
    },
    Notification {
        text: String,
    },
    Chart {
        period: String,
        chart: Chart,
    },
    Subscribed {
        topics: Vec<String>,
    },
    Unsubscribed {
        topics: Vec<String>,
    },
    Pong,
    Error {
        message: String,
    },
}

/// WebSocket client message types
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
}

/// WebSocket client for live updates
pub struct WebSocketClient {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    reconnect_attempts: Rc<RefCell<u32>>,
}

impl WebSocketClient {
    pub fn new(url: &str) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            url: url.to_string(),
            reconnect_attempts: Rc::new(RefCell::new(0)),
        }
    }

    fn from_parts(ws: Rc<RefCell<Option<WebSocket>>>, url: String, attempts: Rc<RefCell<u32>>) -> Self {
        Self {
            ws,
            url,
            reconnect_attempts: attempts,
        }
    }

    /// Connect to the WebSocket server
    pub fn connect(&self, state: GlobalState) {
        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                self.schedule_reconnect(state);
            }
        }
    }

    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState) {
        // On open: subscribe straight away, the server replays current state
        let reconnect = Rc::clone(&self.reconnect_attempts);
        let ws_ref = Rc::clone(&self.ws);
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"WebSocket connected".into());
            state.ws_connected.set(true);
            *reconnect.borrow_mut() = 0;

            let topics = DASHBOARD_TOPICS.iter().map(|t| t.to_string()).collect();
            if let Err(e) = send_on(&ws_ref, &ClientMessage::Subscribe { topics }) {
                web_sys::console::error_1(&format!("Subscribe failed: {}", e).into());
            }
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                handle_message(&text, &state);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let ws_ref = Rc::clone(&self.ws);
        let url = self.url.clone();
        let reconnect = Rc::clone(&self.reconnect_attempts);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            state.ws_connected.set(false);

            let client = WebSocketClient::from_parts(Rc::clone(&ws_ref), url.clone(), Rc::clone(&reconnect));
            client.schedule_reconnect(state);
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Reconnect with exponential backoff, capped at 30s
    fn schedule_reconnect(&self, state: GlobalState) {
        let attempts = *self.reconnect_attempts.borrow();
        if attempts >= MAX_RECONNECT_ATTEMPTS {
            web_sys::console::error_1(&"Max reconnect attempts reached".into());
            state.show_error("Lost connection to the energy tracker");
            return;
        }

        let delay = reconnect_delay_ms(attempts);
        *self.reconnect_attempts.borrow_mut() = attempts + 1;

        let client = WebSocketClient::from_parts(
            Rc::clone(&self.ws),
            self.url.clone(),
            Rc::clone(&self.reconnect_attempts),
        );
        gloo_timers::callback::Timeout::new(delay, move || {
            web_sys::console::log_1(&format!("Attempting reconnect (attempt {})", attempts + 1).into());
            client.connect(state);
        })
        .forget();
    }
}

fn send_on(ws: &RefCell<Option<WebSocket>>, message: &ClientMessage) -> Result<(), String> {
    let guard = ws.borrow();
    let ws = guard.as_ref().ok_or("WebSocket not connected")?;

    let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
    ws.send_with_str(&json).map_err(|e| format!("{:?}", e))
}

fn reconnect_delay_ms(attempts: u32) -> u32 {
    2_u32.saturating_pow(attempts).saturating_mul(1000).min(30_000)
}

/// Apply one server message to the widgets
fn handle_message(text: &str, state: &GlobalState) {
    let msg = match serde_json::from_str::<WsMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to parse WebSocket message: {}", e).into());
            return;
        }
    };

    match msg {
        WsMessage::Connected { connection_id } => {
            web_sys::console::log_1(&format!("Connected with ID: {}", connection_id).into());
        }
        WsMessage::Relays { states } => {
            state.relays.set(states);
            state.touch();
        }
        WsMessage::Tiles { tiles } => {
            state.tiles.set(tiles);
            state.touch();
        }
        WsMessage::Notification { text } => {
            state.notifications.update(|list| list.push(text));
            state.touch();
        }
        WsMessage::Chart { period, chart } => {
            let mut known = true;
            state.charts.update(|charts| known = charts.set(&period, chart));
            if !known {
                web_sys::console::warn_1(&format!("Unknown chart period: {}", period).into());
            }
            state.touch();
        }
        WsMessage::Subscribed { topics } => {
            // The full notification list is replayed right after this
            if topics.iter().any(|t| t == "notifications") {
                state.notifications.set(Vec::new());
            }
        }
        WsMessage::Unsubscribed { topics } => {
            web_sys::console::log_1(&format!("Unsubscribed from: {:?}", topics).into());
        }
        WsMessage::Pong => {}
        WsMessage::Error { message } => {
            web_sys::console::error_1(&format!("Server error: {}", message).into());
            state.show_error(&message);
        }
    }
}

/// `http(s)://host/api/v1` to `ws(s)://host/api/v1/ws`
pub fn ws_url(api_base: &str) -> String {
    let base = api_base
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    format!("{}/ws", base.trim_end_matches('/'))
}

/// Open the live connection (call from app root)
pub fn init_websocket(state: GlobalState, api_base: &str) {
    let client = WebSocketClient::new(&ws_url(api_base));
    client.connect(state);
}
