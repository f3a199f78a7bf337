// Test doubles for the capture session's capabilities.
//
// Each fake records what the session asked of it so tests can check
// side effects (recorder stops, upload calls) alongside state.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use webcam_capture::config::CaptureConfig;
use webcam_capture::{
    CaptureController, Chunk, DeviceError, DeviceInfo, DeviceKind, DeviceSource, RecordedMedia,
    Recorder, UploadError, UploadReceipt, Uploader,
};

pub fn camera(id: &str) -> DeviceInfo {
    DeviceInfo {
        device_id: id.to_string(),
        kind: DeviceKind::VideoInput,
        label: format!("{} camera", id),
        path: PathBuf::from(format!("/dev/{}", id)),
    }
}

pub fn microphone(id: &str) -> DeviceInfo {
    DeviceInfo {
        device_id: id.to_string(),
        kind: DeviceKind::AudioInput,
        label: format!("{} mic", id),
        path: PathBuf::new(),
    }
}

pub fn chunk(size: usize, sequence: u64) -> Chunk {
    Chunk::new(vec![0xAB; size], sequence * 1000, sequence)
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Debug, Clone)]
pub enum Enumeration {
    Devices(Vec<DeviceInfo>),
    Denied,
    Broken,
}

#[derive(Clone)]
pub struct FakeDevices {
    outcome: Arc<Mutex<Enumeration>>,
    calls: Arc<AtomicUsize>,
}

impl FakeDevices {
    pub fn new(outcome: Enumeration) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with(devices: Vec<DeviceInfo>) -> Self {
        Self::new(Enumeration::Devices(devices))
    }

    pub fn set(&self, outcome: Enumeration) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DeviceSource for FakeDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome.lock().unwrap().clone() {
            Enumeration::Devices(devices) => Ok(devices),
            Enumeration::Denied => Err(DeviceError::PermissionDenied("NotAllowedError".to_string())),
            Enumeration::Broken => Err(DeviceError::Unavailable("device busy".to_string())),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Recorder
// ============================================================================

#[derive(Default)]
pub struct RecorderLog {
    pub started_on: Vec<String>,
    pub stops: usize,
    pub sender: Option<mpsc::Sender<Chunk>>,
    /// Chunk flushed while stopping, like a media recorder's last `dataavailable`
    pub final_chunk: Option<Chunk>,
    /// Chunks handed back from `stop` because the channel had no room
    pub overflow: Vec<Chunk>,
    pub fail_start: bool,
}

#[derive(Clone, Default)]
pub struct FakeRecorder {
    pub log: Arc<Mutex<RecorderLog>>,
}

impl FakeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn started_on(&self) -> Vec<String> {
        self.log.lock().unwrap().started_on.clone()
    }

    pub fn flush_on_stop(&self, chunk: Chunk) {
        self.log.lock().unwrap().final_chunk = Some(chunk);
    }

    pub fn overflow_on_stop(&self, chunk: Chunk) {
        self.log.lock().unwrap().overflow.push(chunk);
    }

    pub fn fail_next_start(&self) {
        self.log.lock().unwrap().fail_start = true;
    }

    /// Deliver a chunk through the running recording's channel
    pub async fn emit(&self, chunk: Chunk) {
        let sender = self.log.lock().unwrap().sender.clone();
        if let Some(sender) = sender {
            sender.send(chunk).await.unwrap();
        }
    }
}

#[async_trait::async_trait]
impl Recorder for FakeRecorder {
    async fn start(&mut self, device: &DeviceInfo) -> Result<mpsc::Receiver<Chunk>> {
        let mut log = self.log.lock().unwrap();
        if log.fail_start {
            log.fail_start = false;
            bail!("camera unplugged");
        }

        let (tx, rx) = mpsc::channel(16);
        log.started_on.push(device.device_id.clone());
        log.sender = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<Vec<Chunk>> {
        let mut log = self.log.lock().unwrap();
        log.stops += 1;
        if let (Some(sender), Some(chunk)) = (log.sender.take(), log.final_chunk.take()) {
            sender.try_send(chunk).unwrap();
        }
        log.sender = None;
        Ok(std::mem::take(&mut log.overflow))
    }

    fn is_recording(&self) -> bool {
        self.log.lock().unwrap().sender.is_some()
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Uploader
// ============================================================================

#[derive(Clone)]
pub struct FakeUploader {
    response: Result<String, u16>,
    calls: Arc<AtomicUsize>,
    uploaded: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeUploader {
    pub fn succeeding(url: &str) -> Self {
        Self {
            response: Ok(url.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            uploaded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            response: Err(status),
            ..Self::succeeding("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<Vec<u8>> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, media: RecordedMedia) -> Result<UploadReceipt, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded.lock().unwrap().push(media.bytes);
        match &self.response {
            Ok(url) => Ok(UploadReceipt {
                secure_url: url.clone(),
                public_id: None,
                bytes: None,
                duration: None,
            }),
            Err(status) => Err(UploadError::Status {
                status: *status,
                body: "{\"error\":{\"message\":\"boom\"}}".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub struct Harness {
    pub controller: CaptureController,
    pub devices: FakeDevices,
    pub recorder: FakeRecorder,
    pub uploader: FakeUploader,
}

pub fn harness_with(
    config: CaptureConfig,
    devices: FakeDevices,
    uploader: FakeUploader,
) -> Harness {
    let recorder = FakeRecorder::new();
    let controller = CaptureController::new(
        config,
        Box::new(devices.clone()),
        Box::new(recorder.clone()),
        Box::new(uploader.clone()),
    );

    Harness {
        controller,
        devices,
        recorder,
        uploader,
    }
}

pub fn harness(devices: Vec<DeviceInfo>) -> Harness {
    harness_with(
        CaptureConfig::default(),
        FakeDevices::with(devices),
        FakeUploader::succeeding("https://x/y.mp4"),
    )
}
