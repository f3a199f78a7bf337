use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/recording", get(handlers::get_recording))
        // Session actions
        .route("/session/retry", post(handlers::retry))
        .route("/session/start", post(handlers::start_capture))
        .route("/session/stop", post(handlers::stop_capture))
        .route("/session/switch-device", post(handlers::switch_device))
        .route("/session/restart", post(handlers::restart))
        .route("/session/upload", post(handlers::upload))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
