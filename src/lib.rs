//! # Energy Tracker
//!
//! Smart Energy Tracker - a realtime dashboard for four electrical loads,
//! backed by an observable key-value store.
//!
//! ## Features
//!
//! - **Relay control**: switch each load on or off
//! - **Timers and limits**: per-load run timers and usage limits
//! - **Live telemetry**: voltage, current, power and energy tiles
//! - **Usage charts**: daily, weekly and monthly energy per load
//! - **Snapshot report**: one-page PDF of the current telemetry
//! - **Real-time**: WebSocket push of every view change
//! - **Durability**: write-ahead log behind the in-memory store
//!
//! ## Modules
//!
//! - [`store`]: Observable hierarchical key-value store
//! - [`dashboard`]: Render rules, view model and controller
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Live view updates
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use energy_tracker::dashboard::{DashboardController, DashboardSettings};
//! use energy_tracker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::in_memory());
//!     let controller = DashboardController::new(store, DashboardSettings::default());
//!     let bindings = controller.start().await?;
//!
//!     // Switch load 2 on and set a 30 minute timer for it
//!     controller.toggle_relay(2, true).await?;
//!     controller.apply_timer(Some(2), Some("30".to_string())).await?;
//!
//!     let view = controller.view().await;
//!     println!("{:?}", view.tiles);
//!
//!     bindings.abort();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use store::{
    EventKind, MemoryStore, MemoryStoreConfig, ObservableStore, Snapshot, StoreError,
    StorePath, StoreResult, Subscription,
};

pub use dashboard::{
    DashboardController, DashboardError, DashboardResult, DashboardSettings, DashboardView,
    LoadId, LogPeriod, SnapshotReport, ViewChange, ViewUpdate,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage,
    WsEvent,
};

pub use config::{Config, ConfigError, DashboardConfig, LoggingConfig, ServerConfig, StoreConfig};
