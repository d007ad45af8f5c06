//! EngineActor - owns the session state and serialises every mutation
//!
//! The actor is the single "main context" of the client: user intents, poll
//! results and queries all arrive as [`EngineCommand`]s and are processed one
//! at a time, so a poll tick's diff → recording lifecycle → activity
//! aggregation sequence never interleaves with anything else.
//!
//! Network calls never run on the actor. Status fetches and list refreshes are
//! spawned and post their result back as another command.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use super::commands::{EngineCommand, EngineSnapshot, Intent};
use super::handle::EngineHandle;
use super::poll::PollLifecycleManager;
use crate::client::{ClientError, RecordingState, StatusRecord, StatusService};
use crate::state::{
    ActivityFlags, LifecycleEffect, RecordingLifecycle, SnapshotCache, SnapshotDiffer, Subsystem,
};
use crate::view::{ViewSink, ViewUpdate};

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Poll cadence while anything is active
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

pub struct EngineActor {
    client: Arc<dyn StatusService>,
    view: Box<dyn ViewSink>,

    cache: SnapshotCache,
    recording: RecordingLifecycle,
    flags: ActivityFlags,
    poll: PollLifecycleManager,

    command_rx: mpsc::UnboundedReceiver<EngineCommand>,
    /// Used by spawned fetches to post results back. Weak, so the loop ends
    /// once every handle is dropped.
    command_tx: mpsc::WeakUnboundedSender<EngineCommand>,

    next_seq: u64,
    last_applied_seq: u64,
    /// Fetches issued up to this number predate the latest intent
    intent_fence: u64,
    /// Timer fetch still outstanding; further ticks are skipped until it lands
    tick_in_flight: Option<u64>,
    skipped_ticks: u64,
    discarded_responses: u64,
    failed_polls: u64,
    failed_commands: u64,
    last_error: Option<String>,
    recordings_refreshes: u64,
}

impl EngineActor {
    /// Spawn the actor on the current tokio runtime and return its handle
    pub fn spawn(
        client: Arc<dyn StatusService>,
        view: Box<dyn ViewSink>,
        settings: EngineSettings,
    ) -> EngineHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let tick_tx = cmd_tx.downgrade();
        let poll = PollLifecycleManager::new(
            settings.poll_interval,
            Arc::new(move || {
                if let Some(tx) = tick_tx.upgrade() {
                    let _ = tx.send(EngineCommand::Tick);
                }
            }),
        );

        let actor = EngineActor {
            client,
            view,
            cache: SnapshotCache::new(),
            recording: RecordingLifecycle::new(),
            flags: ActivityFlags::default(),
            poll,
            command_rx: cmd_rx,
            command_tx: cmd_tx.downgrade(),
            next_seq: 0,
            last_applied_seq: 0,
            intent_fence: 0,
            tick_in_flight: None,
            skipped_ticks: 0,
            discarded_responses: 0,
            failed_polls: 0,
            failed_commands: 0,
            last_error: None,
            recordings_refreshes: 0,
        };

        tokio::spawn(actor.run());
        info!("Engine spawned (poll interval {:?})", settings.poll_interval);

        EngineHandle::new(cmd_tx)
    }

    async fn run(mut self) {
        debug!("Engine run loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            trace!(?cmd, "Processing command");

            match cmd {
                EngineCommand::Tick => self.handle_tick(),
                EngineCommand::PollNow { done } => {
                    self.issue_fetch(done);
                }
                EngineCommand::StatusFetched { seq, result, done } => {
                    self.handle_fetched(seq, result);
                    if let Some(done) = done {
                        let _ = done.send(());
                    }
                }
                EngineCommand::Intent(intent) => self.handle_intent(intent),
                EngineCommand::CommandFailed { action, error } => {
                    self.handle_command_failed(action, error)
                }
                EngineCommand::ShowRecordings(files) => {
                    self.recordings_refreshes += 1;
                    self.view.apply(ViewUpdate::Recordings { files });
                }
                EngineCommand::ShowMidiPorts(ports) => {
                    self.view.apply(ViewUpdate::MidiPorts { ports });
                }
                EngineCommand::Snapshot { response } => {
                    let _ = response.send(self.snapshot());
                }
                EngineCommand::Shutdown => {
                    info!("Engine shutting down");
                    break;
                }
            }
        }

        // Also reached when every handle was dropped without a shutdown
        self.poll.stop();
        debug!("Engine run loop exited");
    }

    // =========================================================================
    // Polling
    // =========================================================================

    fn handle_tick(&mut self) {
        if let Some(seq) = self.tick_in_flight {
            self.skipped_ticks += 1;
            trace!("Tick skipped, status #{} still in flight", seq);
            return;
        }
        self.tick_in_flight = self.issue_fetch(None);
    }

    /// Spawn one status fetch; returns its sequence number
    fn issue_fetch(&mut self, done: Option<oneshot::Sender<()>>) -> Option<u64> {
        let tx = self.command_tx.upgrade()?;
        self.next_seq += 1;
        let seq = self.next_seq;
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            let result = client.status().await;
            let _ = tx.send(EngineCommand::StatusFetched { seq, result, done });
        });
        Some(seq)
    }

    fn handle_fetched(&mut self, seq: u64, result: Result<StatusRecord, ClientError>) {
        if self.tick_in_flight == Some(seq) {
            self.tick_in_flight = None;
        }

        if seq <= self.last_applied_seq || seq <= self.intent_fence {
            self.discarded_responses += 1;
            debug!(
                "Discarding stale status #{} (applied #{}, intent after #{})",
                seq, self.last_applied_seq, self.intent_fence
            );
            return;
        }

        match result {
            Ok(record) => {
                self.last_applied_seq = seq;
                self.apply_status(&record);
            }
            Err(e) => {
                self.failed_polls += 1;
                warn!("Status poll #{} failed: {}", seq, e);
            }
        }
    }

    /// One reconciliation pass: diff, recording lifecycle, activity
    fn apply_status(&mut self, record: &StatusRecord) {
        let remote = record.recording.as_ref().map(|r| r.state).unwrap_or_default();
        let elapsed = record.recording.as_ref().map_or(0.0, |r| r.elapsed);

        let mut differ = SnapshotDiffer::new(&mut self.cache, self.view.as_mut());
        differ.reconcile(record);
        let effect = self.recording.observe(remote);
        differ.show_recording(self.recording.state(), elapsed);
        let writes = differ.writes();

        if let Some(running) = record.running {
            self.flags.set(Subsystem::Metronome, running);
        }
        self.flags.set(
            Subsystem::Tracking,
            record.tracking.as_ref().is_some_and(|t| t.enabled),
        );
        self.flags.set(
            Subsystem::Midi,
            record.midi.as_ref().is_some_and(|m| m.enabled),
        );
        self.flags
            .set(Subsystem::Recording, self.recording.is_active());

        trace!("Status #{} applied ({} view writes)", self.last_applied_seq, writes);

        if let Some(effect) = effect {
            self.run_effect(effect);
        }
        self.evaluate_polling();
    }

    fn run_effect(&mut self, effect: LifecycleEffect) {
        match effect {
            LifecycleEffect::RefreshRecordings => {
                let Some(tx) = self.command_tx.upgrade() else {
                    return;
                };
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    match client.list_recordings().await {
                        Ok(files) => {
                            let _ = tx.send(EngineCommand::ShowRecordings(files));
                        }
                        Err(e) => warn!("Failed to refresh recordings list: {}", e),
                    }
                });
            }
        }
    }

    /// Start or stop the timer so that it runs iff any subsystem is active
    fn evaluate_polling(&mut self) {
        if self.flags.should_poll() {
            if self.poll.start() {
                debug!("Polling for {:?}", self.flags.active());
            }
        } else {
            self.poll.stop();
        }
    }

    // =========================================================================
    // Controller outcomes
    // =========================================================================

    fn handle_intent(&mut self, intent: Intent) {
        debug!("Intent: {:?}", intent);

        // A fetch issued before the command was accepted may report the old state
        self.intent_fence = self.next_seq;

        let mut differ = SnapshotDiffer::new(&mut self.cache, self.view.as_mut());
        match intent {
            Intent::MetronomeStarted | Intent::MetronomeStopped => {
                let running = intent == Intent::MetronomeStarted;
                self.flags.set(Subsystem::Metronome, running);
                differ.show_metronome_running(running);
            }
            Intent::TrackingStarted | Intent::TrackingStopped => {
                let enabled = intent == Intent::TrackingStarted;
                self.flags.set(Subsystem::Tracking, enabled);
                differ.show_tracking_enabled(enabled);
            }
            Intent::MidiConnected | Intent::MidiDisconnected => {
                let connected = intent == Intent::MidiConnected;
                self.flags.set(Subsystem::Midi, connected);
                differ.show_midi_enabled(connected);
            }
            Intent::RecordingStarted => {
                if self.recording.start_confirmed() {
                    differ.show_recording(RecordingState::Recording, 0.0);
                }
            }
            Intent::RecordingStopRequested => {
                if self.recording.stop_requested() {
                    differ.show_recording(RecordingState::Saving, 0.0);
                }
            }
        }
        self.flags
            .set(Subsystem::Recording, self.recording.is_active());

        self.evaluate_polling();
    }

    /// Failed user command: record it, change nothing else
    fn handle_command_failed(&mut self, action: &'static str, error: String) {
        self.failed_commands += 1;
        warn!("Command '{}' failed, keeping local state: {}", action, error);
        self.last_error = Some(format!("{}: {}", action, error));
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            recording: self.recording.state(),
            recording_pending: self.recording.is_pending(),
            saves_completed: self.recording.saves_completed(),
            flags: self.flags,
            polling: self.poll.is_running(),
            timers_started: self.poll.timers_started(),
            last_applied_seq: self.last_applied_seq,
            skipped_ticks: self.skipped_ticks,
            discarded_responses: self.discarded_responses,
            failed_polls: self.failed_polls,
            failed_commands: self.failed_commands,
            last_error: self.last_error.clone(),
            recordings_refreshes: self.recordings_refreshes,
            fields: self.cache.entries(),
        }
    }
}
