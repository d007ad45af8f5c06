//! RecordingLifecycle - idle → recording → saving → idle
//!
//! The local state mixes optimistic transitions (applied when a user command
//! succeeds) with confirmed ones (applied from polled status). Divergence
//! from the device is tolerated only inside the two optimistic windows:
//!
//! - local `recording` while the device still reports `idle` (start not yet visible)
//! - local `saving` while the device still reports `recording` (stop not yet visible)
//!
//! A window closes as soon as the device reports the optimistic state (or
//! anything past it). Outside the windows the device state wins.

use tracing::{debug, info};

use crate::client::RecordingState;

/// Side effect requested by a lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    /// A save finished: reload the persisted recordings list
    RefreshRecordings,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLifecycle {
    state: RecordingState,
    /// True while the local state is optimistic and the device has not caught up
    pending: bool,
    saves_completed: u64,
}

impl RecordingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Whether the local state is still waiting for device confirmation
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Number of saving → idle transitions observed this session
    pub fn saves_completed(&self) -> u64 {
        self.saves_completed
    }

    /// Recording or saving: either way the device still has work to report
    pub fn is_active(&self) -> bool {
        self.state != RecordingState::Idle
    }

    /// Start command succeeded. Only honoured from `idle`.
    pub fn start_confirmed(&mut self) -> bool {
        if self.state != RecordingState::Idle {
            debug!("Ignoring recording start while {}", self.state);
            return false;
        }
        self.state = RecordingState::Recording;
        self.pending = true;
        info!("⏺️  Recording (awaiting device confirmation)");
        true
    }

    /// Stop command issued. Only honoured from `recording`.
    pub fn stop_requested(&mut self) -> bool {
        if self.state != RecordingState::Recording {
            debug!("Ignoring recording stop while {}", self.state);
            return false;
        }
        self.state = RecordingState::Saving;
        self.pending = true;
        info!("💾 Saving recording");
        true
    }

    /// Fold one polled device state into the local state
    pub fn observe(&mut self, remote: RecordingState) -> Option<LifecycleEffect> {
        use RecordingState::*;

        let local = self.state;
        if remote == local {
            self.pending = false;
            return None;
        }

        if self.pending {
            match (local, remote) {
                // Device has not picked up our start yet
                (Recording, Idle) => return None,
                // Device has not picked up our stop yet
                (Saving, Recording) => return None,
                _ => {}
            }
        }

        self.state = remote;
        self.pending = false;

        if local == Saving && remote == Idle {
            self.saves_completed += 1;
            info!("✅ Recording saved");
            return Some(LifecycleEffect::RefreshRecordings);
        }

        debug!("Recording state {} -> {} (device)", local, remote);
        None
    }
}
