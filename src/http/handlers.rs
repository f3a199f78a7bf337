use super::state::AppState;
use crate::session::{CaptureError, SessionAction};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub error: String,
}

fn error_response(err: CaptureError) -> Response {
    let (status, code) = match &err {
        CaptureError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
        CaptureError::NothingRecorded => (StatusCode::CONFLICT, "NOTHING_RECORDED"),
        CaptureError::UploadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "UPLOAD_TOO_LARGE"),
        CaptureError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        CaptureError::Device(_) => (StatusCode::SERVICE_UNAVAILABLE, "DEVICE_ERROR"),
        CaptureError::UploadFailed(_) => (StatusCode::BAD_GATEWAY, "UPLOAD_FAILED"),
        CaptureError::SessionClosed => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_CLOSED"),
    };

    if status.is_server_error() {
        error!("{}", err);
    } else {
        warn!("{}", err);
    }

    (
        status,
        Json(ErrorResponse {
            code,
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn perform(state: &AppState, action: SessionAction) -> Response {
    match state.session.perform(action).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
/// Current session snapshot
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot()))
}

/// GET /session/recording
/// Recorded video, available between stop and upload
pub async fn get_recording(State(state): State<AppState>) -> Response {
    match state.session.recording().await {
        Ok(Some(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "video/mp4")],
            bytes,
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                code: "NO_RECORDING",
                error: "No finished recording".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /session/retry
/// Re-run device enumeration from a resting state
pub async fn retry(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::Retry).await
}

/// POST /session/start
pub async fn start_capture(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::StartCapture).await
}

/// POST /session/stop
pub async fn stop_capture(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::StopCapture).await
}

/// POST /session/switch-device
pub async fn switch_device(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::SwitchDevice).await
}

/// POST /session/restart
/// Discard the recording and return to ready
pub async fn restart(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::Restart).await
}

/// POST /session/upload
pub async fn upload(State(state): State<AppState>) -> Response {
    perform(&state, SessionAction::Upload).await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
