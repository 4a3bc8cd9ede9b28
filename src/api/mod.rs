//! Energy Tracker REST API
//!
//! HTTP API layer for the dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Dashboard
//! - `GET /api/v1/dashboard` - Current view
//! - `PUT /api/v1/relays/:n` - Toggle a relay
//! - `POST /api/v1/timer/preset` - Timer preset button
//! - `PUT /api/v1/timer/form` - Edit the timer form
//! - `POST /api/v1/timer/apply` - Apply the timer
//! - `POST /api/v1/limits` - Save usage limits
//! - `POST /api/v1/price` - Save unit price
//! - `POST /api/v1/charts/range` - Range chart trigger
//! - `GET /api/v1/report` - PDF snapshot report
//!
//! ## Store
//! - `GET /api/v1/store` - Whole tree
//! - `GET|PUT|DELETE /api/v1/store/*path` - Read, write or remove a value
//! - `POST /api/v1/store/*path` - Append a child
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Real-time view updates
//!
//! # Example
//!
//! ```rust,ignore
//! use energy_tracker::api::{serve, ApiConfig, AppState};
//! use energy_tracker::dashboard::{DashboardController, DashboardSettings};
//! use energy_tracker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::in_memory());
//!     let controller = Arc::new(DashboardController::new(store, DashboardSettings::default()));
//!     let bindings = controller.start().await?;
//!
//!     let config = ApiConfig::default();
//!     let state = AppState::new(controller, config.clone());
//!     serve(state, &config).await?;
//!
//!     bindings.abort();
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Dashboard routes
        .route("/dashboard", get(routes::view::get_dashboard))
        .route("/relays/:relay", put(routes::controls::toggle_relay))
        .route("/timer/preset", post(routes::controls::select_preset))
        .route("/timer/form", put(routes::controls::edit_timer_form))
        .route("/timer/apply", post(routes::controls::apply_timer))
        .route("/limits", post(routes::controls::save_limits))
        .route("/price", post(routes::controls::save_price))
        .route("/charts/range", post(routes::controls::load_range_chart))
        .route("/report", get(routes::report::download_report))
        // Store routes
        .route("/store", get(routes::store::get_root))
        .route(
            "/store/*path",
            get(routes::store::get_value)
                .put(routes::store::put_value)
                .delete(routes::store::delete_value)
                .post(routes::store::push_value),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Energy tracker API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Energy tracker API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
