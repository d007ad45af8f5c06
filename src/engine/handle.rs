//! EngineHandle - public API for the engine actor
//!
//! Fire-and-forget methods for controller outcomes, async methods with
//! oneshot channels for queries. Cloning the handle is cheap.

use tokio::sync::{mpsc, oneshot};

use super::commands::{EngineCommand, EngineSnapshot, Intent};
use crate::client::{ClientError, RecordingFile};

#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(cmd_tx: mpsc::UnboundedSender<EngineCommand>) -> Self {
        Self { cmd_tx }
    }

    // =========================================================================
    // Fire-and-forget
    // =========================================================================

    /// Apply the local effect of a successful user command
    pub fn intent(&self, intent: Intent) {
        let _ = self.cmd_tx.send(EngineCommand::Intent(intent));
    }

    /// Report a failed user command; local state is left as it was
    pub fn command_failed(&self, action: &'static str, error: &ClientError) {
        let _ = self.cmd_tx.send(EngineCommand::CommandFailed {
            action,
            error: error.to_string(),
        });
    }

    pub fn show_recordings(&self, files: Vec<RecordingFile>) {
        let _ = self.cmd_tx.send(EngineCommand::ShowRecordings(files));
    }

    pub fn show_midi_ports(&self, ports: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::ShowMidiPorts(ports));
    }

    // =========================================================================
    // Async
    // =========================================================================

    /// Fetch and apply one status record now, independent of the timer.
    ///
    /// Resolves once the result has been applied (or discarded/logged).
    pub async fn poll_now(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(EngineCommand::PollNow { done: Some(done_tx) })
            .is_err()
        {
            return;
        }
        let _ = done_rx.await;
    }

    /// Current engine state; `None` if the engine has shut down.
    ///
    /// Commands are processed in order, so everything sent before this call
    /// is reflected in the snapshot.
    pub async fn snapshot(&self) -> Option<EngineSnapshot> {
        let (response_tx, response_rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Snapshot {
                response: response_tx,
            })
            .ok()?;
        response_rx.await.ok()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    #[cfg(test)]
    pub(super) fn send(&self, cmd: EngineCommand) {
        let _ = self.cmd_tx.send(cmd);
    }
}
