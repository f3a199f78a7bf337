use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::source::{DeviceError, DeviceInfo, DeviceKind, DeviceSource};

/// Discovers `videoN` nodes the way video4linux exposes them
pub struct Video4LinuxDeviceSource {
    dev_dir: PathBuf,
    sysfs_dir: PathBuf,
}

impl Video4LinuxDeviceSource {
    pub fn new(dev_dir: PathBuf, sysfs_dir: PathBuf) -> Self {
        Self { dev_dir, sysfs_dir }
    }

    /// Device index for names like `video2`, `None` for anything else
    fn node_index(name: &str) -> Option<u32> {
        name.strip_prefix("video")?.parse().ok()
    }

    async fn label_for(&self, node: &str) -> String {
        let name_path = self.sysfs_dir.join(node).join("name");
        match tokio::fs::read_to_string(&name_path).await {
            Ok(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => node.to_string(),
        }
    }

    async fn probe(path: &Path) -> Result<(), DeviceError> {
        tokio::fs::File::open(path)
            .await
            .map(|_| ())
            .map_err(|e| DeviceError::from_io(path, e))
    }
}

#[async_trait::async_trait]
impl DeviceSource for Video4LinuxDeviceSource {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let mut entries = tokio::fs::read_dir(&self.dev_dir)
            .await
            .map_err(|e| DeviceError::from_io(&self.dev_dir, e))?;

        let mut nodes = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DeviceError::from_io(&self.dev_dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(index) = Self::node_index(&name) {
                nodes.push((index, name, entry.path()));
            }
        }
        nodes.sort_by_key(|(index, _, _)| *index);

        let mut devices = Vec::with_capacity(nodes.len());
        for (_, name, path) in nodes {
            Self::probe(&path).await?;
            let label = self.label_for(&name).await;
            debug!("Found {} ({})", path.display(), label);
            devices.push(DeviceInfo {
                device_id: name,
                kind: DeviceKind::VideoInput,
                label,
                path,
            });
        }

        info!(
            "Found {} video4linux devices in {}",
            devices.len(),
            self.dev_dir.display()
        );
        Ok(devices)
    }

    fn name(&self) -> &str {
        "video4linux"
    }
}
