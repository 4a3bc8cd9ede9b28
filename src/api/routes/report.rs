//! Report Routes
//!
//! - GET /api/v1/report - Telemetry snapshot as a PDF attachment

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::REPORT_FILE_NAME;

/// GET /api/v1/report
///
/// Reads `loads` once and renders it; later telemetry does not change the
/// document.
pub async fn download_report(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let report = state.controller.snapshot_report().await?;
    let pdf = report.to_pdf();

    tracing::info!(bytes = pdf.len(), "Snapshot report generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILE_NAME),
            ),
        ],
        Body::from(pdf),
    )
        .into_response())
}
