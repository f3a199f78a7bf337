use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::CaptureConfig;
use crate::device::DeviceInfo;

/// Binary fragment of a recording
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Encoded media bytes
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
    /// Position in the recording (0-indexed)
    pub sequence: u64,
}

impl Chunk {
    pub fn new(data: Vec<u8>, timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            data,
            timestamp_ms,
            sequence,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Configuration for a recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// How often a chunk is emitted
    pub timeslice: Duration,
    /// Upper bound on the size of a single chunk
    pub max_chunk_bytes: usize,
    /// Channel capacity between the recorder and the session
    pub channel_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_millis(1000),
            max_chunk_bytes: 4 * 1024 * 1024,
            channel_capacity: 64,
        }
    }
}

impl From<&CaptureConfig> for RecorderConfig {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            timeslice: Duration::from_millis(config.timeslice_ms),
            max_chunk_bytes: config.max_chunk_bytes,
            ..Self::default()
        }
    }
}

/// Media recording capability
///
/// A recorder is bound to one device per `start`. Chunks arrive on the
/// returned channel; the channel closes when the source runs dry or after
/// `stop`.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    /// Start recording from `device`
    ///
    /// Returns a channel receiver that will receive chunks
    async fn start(&mut self, device: &DeviceInfo) -> Result<mpsc::Receiver<Chunk>>;

    /// Stop recording
    ///
    /// Never waits on a full chunk channel. Chunks that did not fit are
    /// returned in order; they follow everything already queued.
    async fn stop(&mut self) -> Result<Vec<Chunk>>;

    /// Check if recorder is currently recording
    fn is_recording(&self) -> bool;

    /// Get recorder name for logging
    fn name(&self) -> &str;
}
