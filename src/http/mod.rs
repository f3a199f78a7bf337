//! HTTP control API for a capture session
//!
//! This module exposes the session's user actions:
//! - GET /session - Current snapshot
//! - POST /session/{retry,start,stop,switch-device,restart,upload} - Actions
//! - GET /session/recording - Recorded video for review
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
