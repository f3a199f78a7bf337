use thiserror::Error;

use super::state::CaptureState;
use crate::device::DeviceError;
use crate::upload::UploadError;

/// Errors surfaced to whoever drives a capture session
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera access was refused; the session rests in `permission-denied`
    #[error("camera access denied: {0}")]
    PermissionDenied(String),

    /// No usable device, enumeration failure, or recorder failure
    #[error("device error: {0}")]
    Device(String),

    /// Payload over the upload limit; the session state is unchanged
    #[error("file is too big: {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    UploadFailed(#[from] UploadError),

    #[error("nothing was recorded")]
    NothingRecorded,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: CaptureState,
        action: &'static str,
    },

    #[error("capture session is no longer running")]
    SessionClosed,
}

impl From<DeviceError> for CaptureError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied(msg) => CaptureError::PermissionDenied(msg),
            other => CaptureError::Device(other.to_string()),
        }
    }
}
