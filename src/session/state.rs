use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureState {
    /// Waiting for device access and enumeration
    #[default]
    Initializing,
    /// Camera selected, live preview available
    Ready,
    /// Recording in progress, countdown running
    Recording,
    /// Recording stopped, payload assembled for review
    FinishedRecording,
    /// Upload in flight
    Uploading,
    /// Upload accepted
    Success,
    /// Camera access was refused
    PermissionDenied,
    Error,
}

impl CaptureState {
    /// States that wait for the user to retry
    pub fn is_resting(self) -> bool {
        matches!(
            self,
            CaptureState::Success | CaptureState::Error | CaptureState::PermissionDenied
        )
    }

    /// States that keep a camera bound
    pub fn uses_camera(self) -> bool {
        matches!(self, CaptureState::Ready | CaptureState::Recording)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureState::Initializing => "initializing",
            CaptureState::Ready => "ready",
            CaptureState::Recording => "recording",
            CaptureState::FinishedRecording => "finished-recording",
            CaptureState::Uploading => "uploading",
            CaptureState::Success => "success",
            CaptureState::PermissionDenied => "permission-denied",
            CaptureState::Error => "error",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
