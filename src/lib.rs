pub mod config;
pub mod device;
pub mod http;
pub mod recorder;
pub mod session;
pub mod upload;

pub use config::Config;
pub use device::{DeviceError, DeviceInfo, DeviceKind, DeviceSource, DeviceSourceFactory};
pub use http::{create_router, AppState};
pub use recorder::{Chunk, ChunkBuffer, Recorder, RecorderConfig, StreamRecorder};
pub use session::{
    CaptureController, CaptureError, CaptureState, SessionAction, SessionHandle, SessionRunner,
    SessionSnapshot,
};
pub use upload::{CloudinaryUploader, RecordedMedia, UploadError, UploadReceipt, Uploader};
