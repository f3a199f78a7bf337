//! Capture session management
//!
//! This module provides the `CaptureController` state machine that manages:
//! - Device enumeration and switching
//! - A timed recording with in-memory chunk buffering
//! - Upload of the finished recording
//!
//! and the `SessionRunner` that feeds it user actions, chunks and timer ticks
//! from a single task.

mod controller;
mod error;
mod runner;
mod snapshot;
mod state;

pub use controller::{CaptureController, RecordingEvent};
pub use error::CaptureError;
pub use runner::{SessionAction, SessionCommand, SessionHandle, SessionRunner};
pub use snapshot::SessionSnapshot;
pub use state::CaptureState;
