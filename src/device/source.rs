use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::{ConfiguredDeviceSource, Video4LinuxDeviceSource};
use crate::config::DeviceConfig;

/// Kind of media device, mirroring what a platform enumerator reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Descriptor of a single capture device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Opaque identifier, stable for the lifetime of a session
    pub device_id: String,
    pub kind: DeviceKind,
    /// Human-readable name (may be empty)
    pub label: String,
    /// Node the recorder reads from
    #[serde(skip)]
    pub path: PathBuf,
}

impl DeviceInfo {
    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    /// The platform refused access to the device
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no video input devices found")]
    NoDevices,

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

impl DeviceError {
    /// Classify an I/O failure hit while probing a device node
    pub fn from_io(path: &std::path::Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                DeviceError::PermissionDenied(format!("{}: {}", path.display(), err))
            }
            _ => DeviceError::Unavailable(format!("{}: {}", path.display(), err)),
        }
    }
}

/// Device enumeration capability
///
/// Implementations request access to the devices they report; a refusal must
/// surface as [`DeviceError::PermissionDenied`] so the session can tell it apart
/// from other failures.
#[async_trait::async_trait]
pub trait DeviceSource: Send + Sync {
    /// List available devices of every kind
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Device source factory
pub struct DeviceSourceFactory;

impl DeviceSourceFactory {
    /// Use the configured list when present, otherwise scan video4linux nodes
    pub fn create(config: &DeviceConfig) -> Box<dyn DeviceSource> {
        if config.list.is_empty() {
            Box::new(Video4LinuxDeviceSource::new(
                config.dev_dir.clone(),
                config.sysfs_dir.clone(),
            ))
        } else {
            Box::new(ConfiguredDeviceSource::new(
                config.list.iter().map(DeviceInfo::from).collect(),
            ))
        }
    }
}
