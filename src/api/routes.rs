use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Cron trigger surface
        .route(
            "/api/cron/evaluate-alerts",
            get(handlers::evaluate_alerts).post(handlers::evaluate_alerts),
        )
        .route(
            "/api/cron/hourly-check",
            get(handlers::hourly_check).post(handlers::hourly_check),
        )
        .route("/api/cron/check-center/:id", post(handlers::check_center))
        // Alert history and acknowledgement
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/alerts/:id", patch(handlers::acknowledge_alert))
        // Liveness
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
}
