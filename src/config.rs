use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::device::{DeviceInfo, DeviceKind};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub devices: DeviceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "webcam-capture".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Limits and timing of a recording session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum length of a recording in seconds (countdown start value)
    pub max_seconds: u32,
    /// Largest payload accepted for upload, in bytes
    pub max_upload_bytes: u64,
    /// Countdown tick period in milliseconds
    pub tick_ms: u64,
    /// How often the recorder emits a chunk, in milliseconds
    pub timeslice_ms: u64,
    /// Upper bound on the size of a single chunk
    pub max_chunk_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_seconds: 10,
            max_upload_bytes: 100_000_000,
            tick_ms: 1000,
            timeslice_ms: 1000,
            max_chunk_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Upload destination (Cloudinary unsigned upload)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub upload_preset: String,
    pub folder: String,
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudinary.com".to_string(),
            cloud_name: "demo".to_string(),
            api_key: String::new(),
            upload_preset: "video-test".to_string(),
            folder: "video_test".to_string(),
            timeout_secs: 120,
        }
    }
}

impl UploadConfig {
    /// Full upload URL for video resources
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1_1/{}/video/upload",
            self.base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Directory scanned for `videoN` nodes when no devices are listed
    pub dev_dir: PathBuf,
    /// sysfs directory holding device names
    pub sysfs_dir: PathBuf,
    /// Explicit device list; takes precedence over scanning
    pub list: Vec<DeviceEntry>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
            sysfs_dir: PathBuf::from("/sys/class/video4linux"),
            list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: DeviceKind,
    pub path: PathBuf,
}

fn default_kind() -> DeviceKind {
    DeviceKind::VideoInput
}

impl From<&DeviceEntry> for DeviceInfo {
    fn from(entry: &DeviceEntry) -> Self {
        Self {
            device_id: entry.id.clone(),
            kind: entry.kind,
            label: entry.label.clone(),
            path: entry.path.clone(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read config: {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }
}
