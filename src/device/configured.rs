use tracing::{info, warn};

use super::source::{DeviceError, DeviceInfo, DeviceSource};

/// Devices declared in the config file
///
/// Each video input is opened once for reading during enumeration, which is
/// where a missing permission shows up.
pub struct ConfiguredDeviceSource {
    devices: Vec<DeviceInfo>,
}

impl ConfiguredDeviceSource {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }
}

#[async_trait::async_trait]
impl DeviceSource for ConfiguredDeviceSource {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let mut cameras = 0;
        for device in self.devices.iter().filter(|d| d.is_video_input()) {
            if let Err(e) = tokio::fs::File::open(&device.path).await {
                warn!("Failed to open {} ({})", device.device_id, e);
                return Err(DeviceError::from_io(&device.path, e));
            }
            cameras += 1;
        }

        info!(
            "{} configured cameras available ({} entries)",
            cameras,
            self.devices.len()
        );
        Ok(self.devices.clone())
    }

    fn name(&self) -> &str {
        "configured"
    }
}
