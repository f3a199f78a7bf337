use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::controller::{CaptureController, RecordingEvent};
use super::error::CaptureError;
use super::snapshot::SessionSnapshot;
use super::state::CaptureState;

/// User action on a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionAction {
    Retry,
    StartCapture,
    StopCapture,
    SwitchDevice,
    Restart,
    Upload,
}

/// Request sent to the session runner
#[derive(Debug)]
pub enum SessionCommand {
    /// Perform an action and reply with the resulting snapshot
    Action {
        action: SessionAction,
        reply: oneshot::Sender<Result<SessionSnapshot, CaptureError>>,
    },
    /// Fetch the assembled recording
    Recording {
        reply: oneshot::Sender<Option<Vec<u8>>>,
    },
}

enum RunnerEvent {
    Command(SessionCommand),
    Recording(RecordingEvent),
}

/// Cloneable handle used to drive a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Perform an action and wait for it to complete
    pub async fn perform(&self, action: SessionAction) -> Result<SessionSnapshot, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Action { action, reply })
            .await
            .map_err(|_| CaptureError::SessionClosed)?;

        rx.await.map_err(|_| CaptureError::SessionClosed)?
    }

    /// Assembled recording, if the session is in `finished-recording`
    pub async fn recording(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Recording { reply })
            .await
            .map_err(|_| CaptureError::SessionClosed)?;

        rx.await.map_err(|_| CaptureError::SessionClosed)
    }

    /// Latest published snapshot; never waits on the runner
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until the session reaches `state`
    pub async fn wait_for_state(&self, state: CaptureState) -> Result<SessionSnapshot, CaptureError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(|s| s.state == state)
            .await
            .map_err(|_| CaptureError::SessionClosed)?;
        Ok(snapshot.clone())
    }
}

/// Owns a [`CaptureController`] and feeds it events one at a time
///
/// Commands, chunks and countdown ticks are all handled on the runner task, so
/// the controller never needs a lock.
pub struct SessionRunner {
    controller: CaptureController,
    commands: mpsc::Receiver<SessionCommand>,
}

impl SessionRunner {
    /// Spawn the runner; it enumerates devices immediately
    ///
    /// The runner stops, tearing the session down, once every handle is dropped.
    pub fn spawn(controller: CaptureController) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(32);
        let handle = SessionHandle {
            commands: tx,
            snapshot: controller.subscribe(),
        };

        let runner = Self {
            controller,
            commands: rx,
        };

        (handle, tokio::spawn(runner.run()))
    }

    async fn run(mut self) {
        info!("Session runner started: {}", self.controller.id());

        if let Err(e) = self.controller.enumerate_devices().await {
            warn!("Device setup failed: {}", e);
        }

        loop {
            let event = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => RunnerEvent::Command(command),
                    None => break,
                },
                Some(event) = self.controller.next_recording_event() => RunnerEvent::Recording(event),
            };

            match event {
                RunnerEvent::Command(command) => self.handle_command(command).await,
                RunnerEvent::Recording(event) => self.controller.handle_recording_event(event).await,
            }
        }

        self.controller.teardown().await;
        info!("Session runner stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Action { action, reply } => {
                let result = self.perform(action).await.map(|_| self.controller.snapshot());
                // The caller may have given up waiting
                let _ = reply.send(result);
            }
            SessionCommand::Recording { reply } => {
                let _ = reply.send(self.controller.recording().map(<[u8]>::to_vec));
            }
        }
    }

    async fn perform(&mut self, action: SessionAction) -> Result<(), CaptureError> {
        match action {
            SessionAction::Retry => self.controller.retry().await.map(|_| ()),
            SessionAction::StartCapture => self.controller.start_capture().await,
            SessionAction::StopCapture => {
                self.controller.stop_capture().await;
                Ok(())
            }
            SessionAction::SwitchDevice => {
                self.controller.switch_device();
                Ok(())
            }
            SessionAction::Restart => self.controller.restart(),
            SessionAction::Upload => self.controller.upload().await.map(|_| ()),
        }
    }
}
