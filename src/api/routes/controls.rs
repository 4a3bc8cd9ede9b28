//! Control Routes
//!
//! One endpoint per dashboard gesture. Each performs the gesture's store
//! write and answers with what was written; the view itself only changes
//! when the write comes back through the store subscriptions.
//!
//! - PUT /api/v1/relays/:n - Toggle a relay
//! - POST /api/v1/timer/preset - Preset button
//! - PUT /api/v1/timer/form - Edit load selector or minute field
//! - POST /api/v1/timer/apply - Apply the timer
//! - POST /api/v1/limits - Save usage limits
//! - POST /api/v1/price - Save unit price
//! - POST /api/v1/charts/range - Range chart trigger

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    FormField, LimitsRequest, LimitsResponse, PresetRequest, PriceRequest, PriceResponse,
    RelayRequest, RelayResponse, TimerRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dashboard::{TimerForm, TimerWrite};

/// PUT /api/v1/relays/:n
pub async fn toggle_relay(
    State(state): State<Arc<AppState>>,
    Path(relay): Path<u8>,
    Json(req): Json<RelayRequest>,
) -> ApiResult<(StatusCode, Json<RelayResponse>)> {
    state.controller.toggle_relay(relay, req.checked).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RelayResponse {
            relay,
            checked: req.checked,
        }),
    ))
}

/// POST /api/v1/timer/preset
///
/// Only the configured preset values are accepted.
pub async fn select_preset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PresetRequest>,
) -> ApiResult<Json<TimerForm>> {
    let presets = &state.controller.settings().timer_presets;
    if !presets.contains(&req.minutes) {
        return Err(ApiError::Validation(format!(
            "{} is not a timer preset (available: {:?})",
            req.minutes, presets
        )));
    }

    Ok(Json(state.controller.select_preset(req.minutes).await))
}

/// PUT /api/v1/timer/form
pub async fn edit_timer_form(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimerRequest>,
) -> ApiResult<Json<TimerForm>> {
    let form = state
        .controller
        .edit_timer_form(req.load, req.minutes.map(FormField::into_text))
        .await?;
    Ok(Json(form))
}

/// POST /api/v1/timer/apply
///
/// Body fields override the form; an empty body applies the form as is.
pub async fn apply_timer(
    State(state): State<Arc<AppState>>,
    body: Option<Json<TimerRequest>>,
) -> ApiResult<Json<TimerWrite>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let written = state
        .controller
        .apply_timer(req.load, req.minutes.map(FormField::into_text))
        .await?;
    Ok(Json(written))
}

/// POST /api/v1/limits
pub async fn save_limits(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LimitsRequest>,
) -> ApiResult<Json<LimitsResponse>> {
    let fields = req.hours.map(FormField::into_text);
    let seconds = state.controller.save_limits(&fields).await?;
    Ok(Json(LimitsResponse { seconds }))
}

/// POST /api/v1/price
pub async fn save_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> ApiResult<Json<PriceResponse>> {
    let unit_price = state.controller.save_price(&req.price.into_text()).await?;
    Ok(Json(PriceResponse { unit_price }))
}

/// POST /api/v1/charts/range
pub async fn load_range_chart(State(state): State<Arc<AppState>>) -> StatusCode {
    state.controller.load_range_chart();
    StatusCode::NO_CONTENT
}
