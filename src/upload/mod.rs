pub mod client;
pub mod messages;

pub use client::{CloudinaryUploader, Uploader};
pub use messages::{RecordedMedia, UploadError, UploadReceipt};
