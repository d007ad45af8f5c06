//! Messages processed by the engine actor
//!
//! Everything that can mutate session state arrives here, so the actor
//! applies it strictly in arrival order.

use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::client::{ClientError, RecordingFile, RecordingState, StatusRecord};
use crate::state::{ActivityFlags, Field, Scalar};

/// Locally applied outcome of a successful user command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MetronomeStarted,
    MetronomeStopped,
    TrackingStarted,
    TrackingStopped,
    /// `/recording/start` answered `recording: true`
    RecordingStarted,
    /// `/recording/stop` was accepted
    RecordingStopRequested,
    MidiConnected,
    MidiDisconnected,
}

pub enum EngineCommand {
    // -------------------------------------------------------------------------
    // Polling
    // -------------------------------------------------------------------------
    /// Timer tick: issue one status fetch
    Tick,

    /// Fetch now, regardless of the timer; `done` fires once the result was handled
    PollNow { done: Option<oneshot::Sender<()>> },

    /// A status fetch finished
    StatusFetched {
        seq: u64,
        result: Result<StatusRecord, ClientError>,
        done: Option<oneshot::Sender<()>>,
    },

    // -------------------------------------------------------------------------
    // Controller outcomes
    // -------------------------------------------------------------------------
    /// A user command succeeded; apply its optimistic local effect
    Intent(Intent),

    /// A user command failed; local state stays as it was
    CommandFailed { action: &'static str, error: String },

    /// Fresh recordings list to display
    ShowRecordings(Vec<RecordingFile>),

    /// Fresh MIDI port list to display
    ShowMidiPorts(Vec<String>),

    // -------------------------------------------------------------------------
    // Queries and lifecycle
    // -------------------------------------------------------------------------
    Snapshot {
        response: oneshot::Sender<EngineSnapshot>,
    },

    Shutdown,
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineCommand::Tick => write!(f, "Tick"),
            EngineCommand::PollNow { .. } => write!(f, "PollNow"),
            EngineCommand::StatusFetched { seq, result, .. } => {
                write!(f, "StatusFetched(seq={}, ok={})", seq, result.is_ok())
            }
            EngineCommand::Intent(intent) => write!(f, "Intent({:?})", intent),
            EngineCommand::CommandFailed { action, .. } => write!(f, "CommandFailed({})", action),
            EngineCommand::ShowRecordings(files) => write!(f, "ShowRecordings({})", files.len()),
            EngineCommand::ShowMidiPorts(ports) => write!(f, "ShowMidiPorts({})", ports.len()),
            EngineCommand::Snapshot { .. } => write!(f, "Snapshot"),
            EngineCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Point-in-time copy of the engine's state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub recording: RecordingState,
    /// Recording state is optimistic and not yet confirmed by the device
    pub recording_pending: bool,
    pub saves_completed: u64,
    pub flags: ActivityFlags,
    pub polling: bool,
    pub timers_started: u64,
    /// Sequence number of the last status record applied
    pub last_applied_seq: u64,
    /// Responses dropped because a newer one or a user intent superseded them
    pub discarded_responses: u64,
    /// Timer ticks dropped while a status fetch was outstanding
    pub skipped_ticks: u64,
    pub failed_polls: u64,
    pub failed_commands: u64,
    pub last_error: Option<String>,
    pub recordings_refreshes: u64,
    pub fields: HashMap<Field, Scalar>,
}
