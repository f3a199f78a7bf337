use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use super::messages::{RecordedMedia, UploadError, UploadReceipt};
use crate::config::UploadConfig;

/// Upload capability
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Send a recording and return where it ended up
    async fn upload(&self, media: RecordedMedia) -> Result<UploadReceipt, UploadError>;

    /// Get uploader name for logging
    fn name(&self) -> &str;
}

/// Unsigned multipart upload to a Cloudinary-style media endpoint
pub struct CloudinaryUploader {
    config: UploadConfig,
    client: Client,
}

impl CloudinaryUploader {
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn form(&self, media: RecordedMedia) -> Result<Form, UploadError> {
        let file = Part::bytes(media.bytes)
            .file_name(media.file_name)
            .mime_str(&media.mime_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("upload_preset", self.config.upload_preset.clone())
            .text("folder", self.config.folder.clone()))
    }
}

#[async_trait::async_trait]
impl Uploader for CloudinaryUploader {
    async fn upload(&self, media: RecordedMedia) -> Result<UploadReceipt, UploadError> {
        let url = self.config.endpoint();
        let size = media.len();
        let form = self.form(media)?;

        info!("Uploading {} bytes to {}", size, url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload request failed: {}", e);
                UploadError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Upload failed. Response status: {}", status);
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let receipt: UploadReceipt = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(format!("{}: {}", e, body)))?;

        info!("Upload complete: {}", receipt.secure_url);
        Ok(receipt)
    }

    fn name(&self) -> &str {
        "cloudinary"
    }
}
