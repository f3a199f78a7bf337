use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::CaptureState;
use crate::device::DeviceInfo;

/// Point-in-time view of a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,

    pub state: CaptureState,

    /// Video inputs found during enumeration
    pub devices: Vec<DeviceInfo>,

    /// Device bound to the preview
    pub active_device_id: Option<String>,

    /// Device the running recorder was started on (may differ from the preview)
    pub recording_device_id: Option<String>,

    /// Number of non-empty chunks buffered
    pub chunk_count: usize,

    /// Total size of the buffered chunks
    pub recorded_bytes: u64,

    /// Countdown value in seconds
    pub remaining_seconds: u32,

    /// Time recorded so far as `MM:SS`
    pub elapsed: String,

    /// Where the upload ended up (only in `success`)
    pub upload_url: Option<String>,

    /// Message for `error` / `permission-denied`
    pub error: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn initial(session_id: Uuid, max_seconds: u32) -> Self {
        Self {
            session_id,
            state: CaptureState::Initializing,
            devices: Vec::new(),
            active_device_id: None,
            recording_device_id: None,
            chunk_count: 0,
            recorded_bytes: 0,
            remaining_seconds: max_seconds,
            elapsed: elapsed_label(0),
            upload_url: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Format a number of seconds as `MM:SS`
pub(crate) fn elapsed_label(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
