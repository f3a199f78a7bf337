//! Capture device discovery
//!
//! Devices can come from:
//! - An explicit list in the config file
//! - A scan of video4linux nodes (`/dev/videoN`)

mod configured;
mod source;
mod v4l;

pub use configured::ConfiguredDeviceSource;
pub use source::{DeviceError, DeviceInfo, DeviceKind, DeviceSource, DeviceSourceFactory};
pub use v4l::Video4LinuxDeviceSource;
