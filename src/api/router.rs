use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/api/engine/start", post(handlers::engine::start))
        .route("/api/engine/metrics", get(handlers::engine::metrics))
        .route("/api/engine/stop", post(handlers::engine::stop));

    // Moves funds from the signing identity; requires Bearer token when API_TOKEN is set
    let protected = Router::new()
        .route("/api/engine/withdraw", post(handlers::withdraw::withdraw))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
