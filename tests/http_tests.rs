// Tests for the HTTP control API
//
// Requests go straight into the router via `tower::ServiceExt::oneshot`.

mod common;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::*;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt;
use webcam_capture::config::CaptureConfig;
use webcam_capture::{
    create_router, AppState, CaptureController, CaptureState, SessionHandle, SessionRunner,
    SessionSnapshot,
};

async fn app_with(
    config: CaptureConfig,
    devices: FakeDevices,
    uploader: FakeUploader,
    state: CaptureState,
) -> Result<(Router, SessionHandle, FakeRecorder)> {
    let recorder = FakeRecorder::new();
    let controller = CaptureController::new(
        config,
        Box::new(devices),
        Box::new(recorder.clone()),
        Box::new(uploader),
    );
    let (session, _task) = SessionRunner::spawn(controller);

    timeout(Duration::from_secs(5), session.wait_for_state(state)).await??;

    Ok((create_router(AppState::new(session.clone())), session, recorder))
}

async fn app_in(
    devices: FakeDevices,
    state: CaptureState,
) -> Result<(Router, SessionHandle, FakeRecorder)> {
    app_with(
        CaptureConfig::default(),
        devices,
        FakeUploader::succeeding("https://x/y.mp4"),
        state,
    )
    .await
}

async fn ready_app(devices: FakeDevices) -> Result<(Router, SessionHandle, FakeRecorder)> {
    app_in(devices, CaptureState::Ready).await
}

async fn call(app: &Router, method: &str, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (app, _, _) = ready_app(FakeDevices::with(vec![camera("front")])).await?;

    let (status, body) = call(&app, "GET", "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    Ok(())
}

#[tokio::test]
async fn test_get_session_snapshot() -> Result<()> {
    let (app, _, _) = ready_app(FakeDevices::with(vec![camera("front"), camera("back")])).await?;

    let (status, body) = call(&app, "GET", "/session").await?;
    assert_eq!(status, StatusCode::OK);

    let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
    assert_eq!(snapshot.state, CaptureState::Ready);
    assert_eq!(snapshot.devices.len(), 2);

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["state"], "ready");
    Ok(())
}

#[tokio::test]
async fn test_record_review_and_upload() -> Result<()> {
    let (app, _, recorder) = ready_app(FakeDevices::with(vec![camera("front")])).await?;

    let (status, body) = call(&app, "POST", "/session/start").await?;
    assert_eq!(status, StatusCode::OK);
    let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
    assert_eq!(snapshot.state, CaptureState::Recording);

    let (status, _) = call(&app, "GET", "/session/recording").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    recorder.emit(chunk(4, 0)).await;
    let (status, _) = call(&app, "POST", "/session/stop").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "GET", "/session/recording").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, vec![0xAB; 4]);

    let (status, body) = call(&app, "POST", "/session/upload").await?;
    assert_eq!(status, StatusCode::OK);
    let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
    assert_eq!(snapshot.state, CaptureState::Success);
    assert_eq!(snapshot.upload_url.as_deref(), Some("https://x/y.mp4"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() -> Result<()> {
    let (app, session, _) = ready_app(FakeDevices::with(vec![camera("front")])).await?;

    let (status, body) = call(&app, "POST", "/session/restart").await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(session.snapshot().state, CaptureState::Ready);
    Ok(())
}

#[tokio::test]
async fn test_retry_while_denied_is_forbidden() -> Result<()> {
    let devices = FakeDevices::new(Enumeration::Denied);
    let (app, _, _) = app_in(devices.clone(), CaptureState::PermissionDenied).await?;

    let (status, _) = call(&app, "POST", "/session/retry").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    devices.set(Enumeration::Devices(vec![camera("front")]));
    let (status, body) = call(&app, "POST", "/session/retry").await?;
    assert_eq!(status, StatusCode::OK);
    let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
    assert_eq!(snapshot.state, CaptureState::Ready);
    Ok(())
}

#[tokio::test]
async fn test_switch_device_endpoint() -> Result<()> {
    let (app, _, _) = ready_app(FakeDevices::with(vec![camera("front"), camera("back")])).await?;

    let (status, body) = call(&app, "POST", "/session/switch-device").await?;
    assert_eq!(status, StatusCode::OK);
    let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
    assert_eq!(snapshot.active_device_id.as_deref(), Some("back"));
    Ok(())
}

/// Start, record one chunk and stop, leaving the session in review
async fn record_clip(app: &Router, recorder: &FakeRecorder, size: usize) -> Result<()> {
    let (status, _) = call(app, "POST", "/session/start").await?;
    assert_eq!(status, StatusCode::OK);
    recorder.emit(chunk(size, 0)).await;
    let (status, _) = call(app, "POST", "/session/stop").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() -> Result<()> {
    let config = CaptureConfig {
        max_upload_bytes: 3,
        ..CaptureConfig::default()
    };
    let uploader = FakeUploader::succeeding("https://x/y.mp4");
    let (app, session, recorder) = app_with(
        config,
        FakeDevices::with(vec![camera("front")]),
        uploader.clone(),
        CaptureState::Ready,
    )
    .await?;
    record_clip(&app, &recorder, 4).await?;

    let (status, body) = call(&app, "POST", "/session/upload").await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["code"], "UPLOAD_TOO_LARGE");
    assert_eq!(session.snapshot().state, CaptureState::FinishedRecording);
    assert_eq!(uploader.calls(), 0);

    let (status, _) = call(&app, "GET", "/session/recording").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_failed_upload_is_bad_gateway() -> Result<()> {
    let (app, session, recorder) = app_with(
        CaptureConfig::default(),
        FakeDevices::with(vec![camera("front")]),
        FakeUploader::failing(500),
        CaptureState::Ready,
    )
    .await?;
    record_clip(&app, &recorder, 4).await?;

    let (status, body) = call(&app, "POST", "/session/upload").await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["code"], "UPLOAD_FAILED");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, CaptureState::Error);
    assert!(snapshot.upload_url.is_none());
    Ok(())
}

#[tokio::test]
async fn test_device_failure_is_service_unavailable() -> Result<()> {
    let devices = FakeDevices::new(Enumeration::Broken);
    let (app, session, _) = app_in(devices.clone(), CaptureState::Error).await?;

    let (status, body) = call(&app, "POST", "/session/retry").await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(json["code"], "DEVICE_ERROR");
    assert_eq!(session.snapshot().state, CaptureState::Error);
    assert_eq!(devices.calls(), 2);
    Ok(())
}
