//! Cron trigger endpoints. An external scheduler (or `beacon serve`'s own
//! loops) hits these on fixed cadences; both sweep variants run the same
//! evaluation and differ only in log labeling.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::auth::cron_auth_ok;
use crate::api::state::AppState;
use crate::error::BeaconError;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

fn sweep_failure(label: &str, e: &BeaconError) -> Response {
    error!(error = %e, "[{label}] evaluation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": e.to_string(),
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

/// GET/POST /api/cron/evaluate-alerts
pub async fn evaluate_alerts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !cron_auth_ok(&headers) {
        return unauthorized();
    }

    let date = state.clock.today();
    info!(%date, "[cron] starting alert evaluation");

    match state.orchestrator.evaluate_all_centers(date).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Alert evaluation completed",
                "timestamp": Utc::now(),
                "date": date,
                "summary": summary,
            })),
        )
            .into_response(),
        Err(e) => sweep_failure("cron", &e),
    }
}

/// GET/POST /api/cron/hourly-check
pub async fn hourly_check(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !cron_auth_ok(&headers) {
        return unauthorized();
    }

    let date = state.clock.today();
    info!(%date, "[hourly] starting threshold check");

    match state.orchestrator.evaluate_all_centers(date).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Hourly threshold check completed",
                "timestamp": Utc::now(),
                "date": date,
                "summary": summary,
            })),
        )
            .into_response(),
        Err(e) => sweep_failure("hourly", &e),
    }
}

/// POST /api/cron/check-center/{id} - diagnostic single-center sweep
pub async fn check_center(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(center_id): Path<Uuid>,
) -> Response {
    if !cron_auth_ok(&headers) {
        return unauthorized();
    }

    let date = state.clock.today();
    match state.orchestrator.check_single_center(center_id, date).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Center check completed",
                "timestamp": Utc::now(),
                "date": date,
                "summary": summary,
            })),
        )
            .into_response(),
        Err(BeaconError::CenterNotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Center not found: {id}") })),
        )
            .into_response(),
        Err(e) => sweep_failure("check-center", &e),
    }
}
