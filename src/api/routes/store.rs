//! Store Routes
//!
//! Raw access to the observable store, used by devices to publish
//! telemetry, notifications and usage logs.
//!
//! - GET /api/v1/store - Whole tree
//! - GET /api/v1/store/*path - Value at path (null if absent)
//! - PUT /api/v1/store/*path - Replace value at path
//! - DELETE /api/v1/store/*path - Remove value at path
//! - POST /api/v1/store/*path - Append child with a time-ordered key

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::api::dto::PushResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::StorePath;

/// GET /api/v1/store
pub async fn get_root(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    Ok(Json(state.store.get(&StorePath::root()).await?))
}

/// GET /api/v1/store/*path
pub async fn get_value(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Value>> {
    let path = StorePath::parse(&raw)?;
    Ok(Json(state.store.get(&path).await?))
}

/// PUT /api/v1/store/*path
pub async fn put_value(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(value): Json<Value>,
) -> ApiResult<StatusCode> {
    let path = StorePath::parse(&raw)?;
    state.store.set(&path, value).await?;

    tracing::debug!(path = %path, "Store value written");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/store/*path
pub async fn delete_value(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<StatusCode> {
    let path = StorePath::parse(&raw)?;
    state.store.remove(&path).await?;

    tracing::debug!(path = %path, "Store value removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/store/*path
pub async fn push_value(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(value): Json<Value>,
) -> ApiResult<(StatusCode, Json<PushResponse>)> {
    let path = StorePath::parse(&raw)?;
    let key = state.store.push(&path, value).await?;
    let child = path.child(&key)?;

    tracing::debug!(path = %child, "Store child appended");
    Ok((
        StatusCode::CREATED,
        Json(PushResponse {
            key,
            path: child.to_string(),
        }),
    ))
}
