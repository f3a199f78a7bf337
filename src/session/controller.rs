use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::CaptureError;
use super::snapshot::{elapsed_label, SessionSnapshot};
use super::state::CaptureState;
use crate::config::CaptureConfig;
use crate::device::{DeviceError, DeviceInfo, DeviceSource};
use crate::recorder::{Chunk, ChunkBuffer, Recorder};
use crate::upload::{RecordedMedia, Uploader};

/// Something that happened while recording
#[derive(Debug)]
pub enum RecordingEvent {
    /// The recorder produced a chunk
    Chunk(Chunk),
    /// One countdown period elapsed
    Tick,
}

/// Resources that exist only while recording
///
/// Dropping this cancels the countdown and detaches the chunk stream.
struct ActiveRecording {
    chunks: mpsc::Receiver<Chunk>,
    chunks_closed: bool,
    countdown: Interval,
    device_id: String,
}

impl ActiveRecording {
    fn new(chunks: mpsc::Receiver<Chunk>, tick: Duration, device_id: String) -> Self {
        let mut countdown = interval_at(Instant::now() + tick, tick);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            chunks,
            chunks_closed: false,
            countdown,
            device_id,
        }
    }
}

/// State machine for one capture session
///
/// All platform access goes through the injected device source, recorder and
/// uploader. Every transition is published as a [`SessionSnapshot`].
pub struct CaptureController {
    id: Uuid,
    config: CaptureConfig,
    device_source: Box<dyn DeviceSource>,
    recorder: Box<dyn Recorder>,
    uploader: Box<dyn Uploader>,

    state: CaptureState,
    devices: Vec<DeviceInfo>,
    active_device: Option<usize>,
    buffer: ChunkBuffer,
    payload: Option<Vec<u8>>,
    remaining_seconds: u32,
    upload_url: Option<String>,
    last_error: Option<String>,
    active: Option<ActiveRecording>,

    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl CaptureController {
    pub fn new(
        config: CaptureConfig,
        device_source: Box<dyn DeviceSource>,
        recorder: Box<dyn Recorder>,
        uploader: Box<dyn Uploader>,
    ) -> Self {
        let id = Uuid::new_v4();
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial(id, config.max_seconds));

        info!(
            "Capture session {} created (devices: {}, recorder: {}, uploader: {})",
            id,
            device_source.name(),
            recorder.name(),
            uploader.name()
        );

        Self {
            id,
            remaining_seconds: config.max_seconds,
            config,
            device_source,
            recorder,
            uploader,
            state: CaptureState::Initializing,
            devices: Vec::new(),
            active_device: None,
            buffer: ChunkBuffer::new(),
            payload: None,
            upload_url: None,
            last_error: None,
            active: None,
            snapshot_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn active_device(&self) -> Option<&DeviceInfo> {
        self.active_device.and_then(|i| self.devices.get(i))
    }

    pub fn active_device_id(&self) -> Option<&str> {
        self.active_device().map(|d| d.device_id.as_str())
    }

    /// Device the running recorder is bound to
    pub fn recording_device_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.device_id.as_str())
    }

    pub fn recorded_chunks(&self) -> &[Chunk] {
        self.buffer.chunks()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn upload_url(&self) -> Option<&str> {
        self.upload_url.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Assembled payload, available for review in `finished-recording`
    pub fn recording(&self) -> Option<&[u8]> {
        match self.state {
            CaptureState::FinishedRecording => self.payload.as_deref(),
            _ => None,
        }
    }

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            devices: self.devices.clone(),
            active_device_id: self.active_device_id().map(str::to_string),
            recording_device_id: self.recording_device_id().map(str::to_string),
            chunk_count: self.buffer.len(),
            recorded_bytes: self.buffer.total_bytes(),
            remaining_seconds: self.remaining_seconds,
            elapsed: elapsed_label(self.config.max_seconds.saturating_sub(self.remaining_seconds)),
            upload_url: self.upload_url.clone(),
            error: self.last_error.clone(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn transition(&mut self, next: CaptureState) {
        info!("Session {}: {} -> {}", self.id, self.state, next);
        self.state = next;

        if next != CaptureState::Success {
            self.upload_url = None;
        }
        if !matches!(next, CaptureState::Error | CaptureState::PermissionDenied) {
            self.last_error = None;
        }

        self.publish();
    }

    /// Move to a resting failure state and hand the error back
    fn fail(&mut self, next: CaptureState, err: CaptureError) -> CaptureError {
        error!("Session {}: {}", self.id, err);
        self.last_error = Some(err.to_string());
        self.transition(next);
        err
    }

    fn invalid(&self, action: &'static str) -> CaptureError {
        warn!("Session {}: cannot {} while {}", self.id, action, self.state);
        CaptureError::InvalidTransition {
            state: self.state,
            action,
        }
    }

    fn reset_recording(&mut self) {
        self.buffer.clear();
        self.payload = None;
        self.remaining_seconds = self.config.max_seconds;
    }

    /// Request camera access and list video inputs
    ///
    /// On success the first camera becomes active and the session is `ready`.
    /// A refusal rests in `permission-denied`; any other failure, including
    /// finding no camera at all, rests in `error`.
    pub async fn enumerate_devices(&mut self) -> Result<&[DeviceInfo], CaptureError> {
        if self.state != CaptureState::Initializing {
            return Err(self.invalid("enumerate devices"));
        }

        let cameras: Vec<DeviceInfo> = match self.device_source.enumerate().await {
            Ok(devices) => devices.into_iter().filter(DeviceInfo::is_video_input).collect(),
            Err(DeviceError::PermissionDenied(msg)) => {
                return Err(self.fail(
                    CaptureState::PermissionDenied,
                    CaptureError::PermissionDenied(msg),
                ));
            }
            Err(e) => return Err(self.fail(CaptureState::Error, e.into())),
        };

        if cameras.is_empty() {
            return Err(self.fail(CaptureState::Error, DeviceError::NoDevices.into()));
        }

        info!(
            "Session {}: {} cameras, using {}",
            self.id,
            cameras.len(),
            cameras[0].device_id
        );
        self.devices = cameras;
        self.active_device = Some(0);
        self.transition(CaptureState::Ready);

        Ok(&self.devices)
    }

    /// Start over from a resting state by enumerating devices again
    pub async fn retry(&mut self) -> Result<&[DeviceInfo], CaptureError> {
        if !self.state.is_resting() {
            return Err(self.invalid("retry"));
        }

        self.devices.clear();
        self.active_device = None;
        self.reset_recording();
        self.transition(CaptureState::Initializing);

        self.enumerate_devices().await
    }

    /// Bind the preview to the next camera, wrapping around
    ///
    /// A no-op with fewer than two cameras or outside `ready`/`recording`.
    /// While recording, the recorder keeps the camera it was started on.
    pub fn switch_device(&mut self) -> Option<&DeviceInfo> {
        if !self.state.uses_camera() || self.devices.len() < 2 {
            return self.active_device();
        }

        let next = self.active_device.map_or(0, |i| (i + 1) % self.devices.len());
        self.active_device = Some(next);

        let device_id = &self.devices[next].device_id;
        match &self.active {
            Some(active) => info!(
                "Session {}: preview switched to {}, still recording from {}",
                self.id, device_id, active.device_id
            ),
            None => info!("Session {}: switched to {}", self.id, device_id),
        }

        self.publish();
        self.active_device()
    }

    /// Begin recording from the active camera
    pub async fn start_capture(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Ready {
            return Err(self.invalid("start recording"));
        }
        let Some(device) = self.active_device().cloned() else {
            return Err(self.fail(CaptureState::Error, DeviceError::NoDevices.into()));
        };

        self.reset_recording();

        let chunks = match self.recorder.start(&device).await {
            Ok(chunks) => chunks,
            Err(e) => {
                return Err(self.fail(CaptureState::Error, CaptureError::Device(format!("{:#}", e))));
            }
        };

        let tick = Duration::from_millis(self.config.tick_ms);
        self.active = Some(ActiveRecording::new(chunks, tick, device.device_id));
        self.transition(CaptureState::Recording);

        Ok(())
    }

    /// Buffer a chunk from the recorder
    ///
    /// Empty chunks and chunks arriving outside `recording` are ignored.
    /// Returns whether the chunk was kept.
    pub fn on_chunk_available(&mut self, chunk: Chunk) -> bool {
        if self.state != CaptureState::Recording {
            debug!("Session {}: ignoring chunk while {}", self.id, self.state);
            return false;
        }

        let kept = self.buffer.push(chunk);
        if kept {
            self.publish();
        }
        kept
    }

    /// Finish the recording
    ///
    /// Cancels the countdown, stops the recorder, keeps any chunk it flushed
    /// while stopping, and assembles the payload. Outside `recording` this
    /// does nothing.
    pub async fn stop_capture(&mut self) {
        if self.state != CaptureState::Recording {
            debug!("Session {}: stop ignored while {}", self.id, self.state);
            return;
        }

        let active = self.active.take();

        let tail = match self.recorder.stop().await {
            Ok(tail) => tail,
            Err(e) => {
                warn!("Session {}: failed to stop recorder: {:#}", self.id, e);
                Vec::new()
            }
        };

        if let Some(mut active) = active {
            while let Ok(chunk) = active.chunks.try_recv() {
                self.buffer.push(chunk);
            }
        }
        for chunk in tail {
            self.buffer.push(chunk);
        }

        self.payload = Some(self.buffer.assemble());
        info!(
            "Session {}: recorded {} chunks ({} bytes)",
            self.id,
            self.buffer.len(),
            self.buffer.total_bytes()
        );
        self.transition(CaptureState::FinishedRecording);
    }

    /// Advance the countdown by one second
    ///
    /// Stops the recording when the countdown reaches zero.
    pub async fn tick(&mut self) {
        if self.state != CaptureState::Recording {
            return;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            info!("Session {}: time limit reached", self.id);
            self.stop_capture().await;
        } else {
            self.publish();
        }
    }

    /// Discard the recording and go back to `ready`
    pub fn restart(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::FinishedRecording {
            return Err(self.invalid("restart"));
        }

        self.reset_recording();
        self.transition(CaptureState::Ready);
        Ok(())
    }

    /// Upload the finished recording
    ///
    /// An oversized payload is refused without touching the network or the
    /// session state. Any other failure rests in `error`.
    pub async fn upload(&mut self) -> Result<&str, CaptureError> {
        if self.state != CaptureState::FinishedRecording {
            return Err(self.invalid("upload"));
        }
        if self.buffer.is_empty() {
            warn!("Session {}: nothing to upload", self.id);
            return Err(CaptureError::NothingRecorded);
        }

        let size = self.buffer.total_bytes();
        if size > self.config.max_upload_bytes {
            warn!("Session {}: file is too big ({} bytes)", self.id, size);
            return Err(CaptureError::UploadTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }

        let payload = match self.payload.take() {
            Some(payload) => payload,
            None => self.buffer.assemble(),
        };
        self.transition(CaptureState::Uploading);

        let result = self.uploader.upload(RecordedMedia::mp4(payload)).await;
        self.buffer.clear();

        match result {
            Ok(receipt) => {
                self.upload_url = Some(receipt.secure_url);
                self.transition(CaptureState::Success);
                Ok(self.upload_url.as_deref().unwrap_or_default())
            }
            Err(e) => Err(self.fail(CaptureState::Error, e.into())),
        }
    }

    /// Wait for the next chunk or countdown tick of the running recording
    ///
    /// Returns `None` straight away when nothing is being recorded. Safe to
    /// cancel.
    pub async fn next_recording_event(&mut self) -> Option<RecordingEvent> {
        let active = self.active.as_mut()?;

        loop {
            tokio::select! {
                chunk = active.chunks.recv(), if !active.chunks_closed => match chunk {
                    Some(chunk) => return Some(RecordingEvent::Chunk(chunk)),
                    None => {
                        debug!("Recorder stream closed");
                        active.chunks_closed = true;
                    }
                },
                _ = active.countdown.tick() => return Some(RecordingEvent::Tick),
            }
        }
    }

    /// Apply an event returned by [`next_recording_event`](Self::next_recording_event)
    pub async fn handle_recording_event(&mut self, event: RecordingEvent) {
        match event {
            RecordingEvent::Chunk(chunk) => {
                self.on_chunk_available(chunk);
            }
            RecordingEvent::Tick => self.tick().await,
        }
    }

    /// Release the recorder and timer; used when the session goes away
    pub async fn teardown(&mut self) {
        if self.active.take().is_some() {
            if let Err(e) = self.recorder.stop().await {
                warn!("Session {}: failed to stop recorder: {:#}", self.id, e);
            }
        }
        info!("Session {} closed in state {}", self.id, self.state);
    }
}
