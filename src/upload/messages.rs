use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A finished recording, ready to be sent
#[derive(Debug, Clone)]
pub struct RecordedMedia {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl RecordedMedia {
    pub fn mp4(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "recording.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Upload response body; only `secure_url` is required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("invalid upload response: {0}")]
    InvalidResponse(String),
}
