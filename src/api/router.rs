use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::auth::{require_admin, require_auth};
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::status::health_check))
        .route("/metrics", get(handlers::status::metrics))
        .route("/api/login", post(handlers::login::login));

    // Account administration: admins only
    let admin = Router::new()
        .route("/api/users", get(handlers::users::list).post(handlers::users::create))
        .route_layer(middleware::from_fn(require_admin));

    // Everything else needs a valid bearer token for an active user
    let protected = Router::new()
        // Users
        .route("/api/users/me", get(handlers::users::me))
        .route("/api/users/me/change-password", post(handlers::users::change_password))
        .route("/api/users/:id", put(handlers::users::update))
        .route(
            "/api/users/:id/avatar",
            get(handlers::users::get_avatar).post(handlers::users::upload_avatar),
        )
        // Trades
        .route("/api/trades", get(handlers::trades::list).post(handlers::trades::create))
        .route("/api/trades/import", post(handlers::trades::import))
        .route(
            "/api/trades/:id",
            put(handlers::trades::update).delete(handlers::trades::delete),
        )
        .route("/api/trades/:id/cancel", post(handlers::trades::cancel))
        // Report
        .route("/api/report", get(handlers::report::get_report))
        // Assistant
        .route("/api/ai/ask", post(handlers::ai::ask))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
