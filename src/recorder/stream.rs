use anyhow::{bail, Context, Result};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use super::backend::{Chunk, Recorder, RecorderConfig};
use crate::device::DeviceInfo;

/// Records by reading a device node (or any readable file) once per timeslice
///
/// Every read becomes one chunk. End of file closes the chunk stream; `stop`
/// performs one last read so data produced since the previous timeslice is
/// not lost. A reader blocked on a full channel still honours `stop`, and
/// whatever cannot be queued comes back from `stop` instead.
pub struct StreamRecorder {
    config: RecorderConfig,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Vec<Chunk>>>,
}

impl StreamRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            stop_tx: None,
            task: None,
        }
    }

    async fn read_chunk(
        file: &mut File,
        buf: &mut [u8],
        started: Instant,
        sequence: u64,
    ) -> std::io::Result<Option<Chunk>> {
        let n = file.read(buf).await?;
        if n == 0 {
            return Ok(None);
        }
        let timestamp_ms = started.elapsed().as_millis() as u64;
        Ok(Some(Chunk::new(buf[..n].to_vec(), timestamp_ms, sequence)))
    }

    async fn run(
        mut file: File,
        config: RecorderConfig,
        tx: mpsc::Sender<Chunk>,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> Vec<Chunk> {
        let started = Instant::now();
        let mut ticker = interval_at(started + config.timeslice, config.timeslice);
        let mut buf = vec![0u8; config.max_chunk_bytes.max(1)];
        let mut sequence = 0u64;
        let mut tail = Vec::new();

        loop {
            let chunk = tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    match Self::read_chunk(&mut file, &mut buf, started, sequence).await {
                        Ok(Some(chunk)) => chunk,
                        Ok(None) => {
                            info!("Stream ended after {} chunks", sequence);
                            return tail;
                        }
                        Err(e) => {
                            error!("Failed to read chunk: {}", e);
                            return tail;
                        }
                    }
                }
            };

            debug!("Chunk {} ({} bytes)", sequence, chunk.len());
            sequence += 1;

            // Waiting for room must not hold off a stop
            tokio::select! {
                permit = tx.reserve() => match permit {
                    Ok(permit) => permit.send(chunk),
                    Err(_) => {
                        debug!("Chunk receiver dropped");
                        return tail;
                    }
                },
                _ = &mut stop_rx => {
                    tail.push(chunk);
                    break;
                }
            }
        }

        match Self::read_chunk(&mut file, &mut buf, started, sequence).await {
            Ok(Some(chunk)) => tail.push(chunk),
            Ok(None) => {}
            Err(e) => error!("Failed to read final chunk: {}", e),
        }

        Self::queue_tail(&tx, tail)
    }

    /// Queue what fits and hand back the rest, keeping order
    fn queue_tail(tx: &mpsc::Sender<Chunk>, tail: Vec<Chunk>) -> Vec<Chunk> {
        let mut rest = Vec::new();
        for chunk in tail {
            if !rest.is_empty() {
                rest.push(chunk);
                continue;
            }
            match tx.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(chunk)) | Err(TrySendError::Closed(chunk)) => {
                    rest.push(chunk)
                }
            }
        }

        if !rest.is_empty() {
            warn!("Chunk channel full, returning {} chunks from stop", rest.len());
        }
        rest
    }
}

#[async_trait::async_trait]
impl Recorder for StreamRecorder {
    async fn start(&mut self, device: &DeviceInfo) -> Result<mpsc::Receiver<Chunk>> {
        if self.is_recording() {
            bail!("Recorder already running");
        }

        let file = File::open(&device.path)
            .await
            .with_context(|| format!("Failed to open {}", device.path.display()))?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        info!(
            "Recording from {} ({}ms timeslice)",
            device.path.display(),
            self.config.timeslice.as_millis()
        );

        self.task = Some(tokio::spawn(Self::run(
            file,
            self.config.clone(),
            tx,
            stop_rx,
        )));
        self.stop_tx = Some(stop_tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<Vec<Chunk>> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have ended on EOF
            let _ = stop_tx.send(());
        }

        match self.task.take() {
            Some(task) => task.await.context("Recorder task panicked"),
            None => Ok(Vec::new()),
        }
    }

    fn is_recording(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn name(&self) -> &str {
        "stream"
    }
}

impl Drop for StreamRecorder {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
