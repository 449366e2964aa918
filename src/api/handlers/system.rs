//! Liveness endpoint for process supervision.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::api::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let database_ok = match &state.pool {
        Some(pool) => sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .is_ok(),
        None => true,
    };

    let status = if database_ok { "healthy" } else { "degraded" };
    let code = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let uptime_seconds = (Utc::now() - state.started_at).num_seconds().max(0);

    (
        code,
        Json(json!({
            "status": status,
            "timestamp": Utc::now(),
            "uptime_seconds": uptime_seconds,
            "database": database_ok,
            "channels": state.channels,
        })),
    )
        .into_response()
}
