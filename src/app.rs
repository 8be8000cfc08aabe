//! Router assembly for the dashboard API.

use crate::handlers::{self, AppState};
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies are tiny status updates; anything larger is refused.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Dataset endpoints, without state or outer middleware.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/test", get(handlers::api_test))
        .route("/api/leads", get(handlers::get_leads))
        .route("/api/leads/:id", patch(handlers::update_lead_status))
        .route("/api/seo", get(handlers::get_seo))
        .route("/api/keywords", get(handlers::get_keywords))
        .route("/api/ai-logs", get(handlers::get_ai_logs))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Wraps `api` with the health check, tracing and CORS.
///
/// The health check is kept outside `api` so per-route layers added by the
/// caller (rate limiting) never apply to it.
pub fn build_router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// The full application without rate limiting.
pub fn router(state: Arc<AppState>) -> Router {
    build_router(state, api_routes())
}
