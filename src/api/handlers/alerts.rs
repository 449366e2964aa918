//! Alert history and acknowledgement endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::domain::{AckFilter, AlertQuery, AlertStats, Priority};
use crate::engine::AckOutcome;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub center_id: Option<Uuid>,
    pub days: Option<i64>,
    /// all | acknowledged | unacknowledged
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// GET /api/alerts?center_id=..&days=7&status=all&priority=critical
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let status = match params.status.as_deref() {
        None | Some("all") => AckFilter::All,
        Some("acknowledged") => AckFilter::Acknowledged,
        Some("unacknowledged") => AckFilter::Unacknowledged,
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unknown status filter: {other}") })),
            )
                .into_response();
        }
    };

    let priority = match params.priority.as_deref() {
        None => None,
        Some(raw) => match Priority::parse(raw) {
            Some(p) => Some(p),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("unknown priority: {raw}") })),
                )
                    .into_response();
            }
        },
    };

    let query = AlertQuery {
        center_id: params.center_id,
        days: params.days.unwrap_or(7),
        status,
        priority,
    };

    match state.ledger.history(&query).await {
        Ok(rows) => {
            let stats = AlertStats::from_rows(&rows);
            let alerts: Vec<_> = rows
                .into_iter()
                .map(|(alert, priority)| {
                    let mut value = serde_json::to_value(alert).unwrap_or_default();
                    if let Some(map) = value.as_object_mut() {
                        map.insert("priority".to_string(), json!(priority.as_str()));
                    }
                    value
                })
                .collect();

            (
                StatusCode::OK,
                Json(json!({
                    "alerts": alerts,
                    "stats": stats,
                    "filters": {
                        "center_id": query.center_id,
                        "days": query.days,
                        "status": query.status,
                        "priority": query.priority,
                    },
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to load alert history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: String,
    pub response_action: Option<String>,
}

/// PATCH /api/alerts/{id} - acknowledge an alert (first write wins)
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(body): Json<AcknowledgeRequest>,
) -> Response {
    match state
        .ledger
        .acknowledge(alert_id, &body.acknowledged_by, body.response_action.as_deref())
        .await
    {
        Ok(AckOutcome::Acknowledged) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Alert acknowledged" })),
        )
            .into_response(),
        Ok(AckOutcome::AlreadyAcknowledged) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Alert already acknowledged" })),
        )
            .into_response(),
        Ok(AckOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Alert not found: {alert_id}") })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, %alert_id, "failed to acknowledge alert");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
