//! State Management
//!
//! Global dashboard state and the live WebSocket connection.

pub mod global;
pub mod websocket;

pub use global::{provide_global_state, GlobalState};
