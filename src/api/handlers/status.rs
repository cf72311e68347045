use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// GET /health: database ping plus reasoning-service availability
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    let reasoning = if state.reasoning.is_some() {
        "configured"
    } else {
        "disabled"
    };

    if db_ok {
        (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "reasoning": reasoning })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "db": "disconnected", "reasoning": reasoning })),
        )
    }
}

/// GET /metrics: Prometheus scrape payload
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}
