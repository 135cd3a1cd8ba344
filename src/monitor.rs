//! Per-container readiness monitoring over followed logs.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bollard::container::LogOutput;
use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio_util::io::StreamReader;

use crate::lines::read_lines;
use crate::runtime::ContainerRuntime;

/// How a wait on a [`ReadySignal`] concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The readiness marker appeared in the container's output.
    Ready,
    /// The log stream ended without the marker ever appearing.
    LogsClosed,
    /// The caller-supplied deadline expired first.
    TimedOut,
}

/// One-shot readiness notification returned by
/// [`DockerController::start`](crate::DockerController::start).
///
/// The signal fires at most once. A container whose output ends before the
/// marker is seen resolves to [`ReadyOutcome::LogsClosed`] rather than an
/// error, so "never became ready" stays distinguishable from "I stopped
/// waiting".
#[derive(Debug)]
pub struct ReadySignal {
    rx: oneshot::Receiver<()>,
}

impl ReadySignal {
    pub(crate) fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Waits until the marker is seen or the log stream ends.
    pub async fn wait(self) -> ReadyOutcome {
        match self.rx.await {
            Ok(()) => ReadyOutcome::Ready,
            Err(_) => ReadyOutcome::LogsClosed,
        }
    }

    /// Waits like [`wait`](Self::wait), giving up after `deadline`.
    pub async fn wait_timeout(self, deadline: Duration) -> ReadyOutcome {
        match tokio::time::timeout(deadline, self.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => ReadyOutcome::TimedOut,
        }
    }
}

/// Follows a container's combined output until the stream ends, logging
/// every line and firing `ready_tx` on the first line containing `marker`.
///
/// An empty marker never matches; the channel then closes when the stream
/// ends. Spawned as a detached task so a caller abandoning its readiness
/// wait never severs log following; the stream ends on its own once the
/// container stops or is removed, and a stream error only ends the line
/// sequence without ever reaching the controller.
pub(crate) async fn follow_logs(
    runtime: Arc<dyn ContainerRuntime>,
    container_id: String,
    container_name: String,
    ready_tx: oneshot::Sender<()>,
    marker: String,
) {
    let frames = runtime
        .logs_stream(&container_id)
        .map(|frame| frame.map(LogOutput::into_bytes).map_err(io::Error::other));
    let mut lines = read_lines(StreamReader::new(frames));

    let mut ready_tx = Some(ready_tx);
    while let Some(line) = lines.next().await {
        let text = String::from_utf8_lossy(&line);
        log::info!("[{container_name}] {text}");
        if !marker.is_empty() && text.contains(&marker) {
            // first match wins; the sender is gone afterwards
            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(());
            }
        }
    }

    log::info!("Logs finished for container {container_name}");
}
