//! View Routes
//!
//! - GET /api/v1/dashboard - Current dashboard view

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::DashboardResponse;
use crate::api::state::AppState;

/// GET /api/v1/dashboard
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        view: state.controller.view().await,
        timer_presets: state.controller.settings().timer_presets.clone(),
    })
}
