//! ActivityAggregator - does anything still need the poll loop?
//!
//! Four independent flags, one per subsystem. Polling runs while at least one
//! is set, so stopping one subsystem never kills polling another one needs.

use serde::Serialize;

/// Subsystem whose activity feeds the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Metronome,
    Tracking,
    Recording,
    Midi,
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subsystem::Metronome => write!(f, "metronome"),
            Subsystem::Tracking => write!(f, "tracking"),
            Subsystem::Recording => write!(f, "recording"),
            Subsystem::Midi => write!(f, "midi"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityFlags {
    pub metronome_running: bool,
    pub tracking_enabled: bool,
    /// Recording or saving on the device
    pub recording_active: bool,
    pub midi_connected: bool,
}

impl ActivityFlags {
    pub fn should_poll(&self) -> bool {
        self.metronome_running
            || self.tracking_enabled
            || self.recording_active
            || self.midi_connected
    }

    pub fn get(&self, subsystem: Subsystem) -> bool {
        match subsystem {
            Subsystem::Metronome => self.metronome_running,
            Subsystem::Tracking => self.tracking_enabled,
            Subsystem::Recording => self.recording_active,
            Subsystem::Midi => self.midi_connected,
        }
    }

    /// Set one flag; returns true if it changed
    pub fn set(&mut self, subsystem: Subsystem, active: bool) -> bool {
        let slot = match subsystem {
            Subsystem::Metronome => &mut self.metronome_running,
            Subsystem::Tracking => &mut self.tracking_enabled,
            Subsystem::Recording => &mut self.recording_active,
            Subsystem::Midi => &mut self.midi_connected,
        };
        let changed = *slot != active;
        *slot = active;
        changed
    }

    /// Names of the active subsystems, for logging
    pub fn active(&self) -> Vec<Subsystem> {
        [
            Subsystem::Metronome,
            Subsystem::Tracking,
            Subsystem::Recording,
            Subsystem::Midi,
        ]
        .into_iter()
        .filter(|s| self.get(*s))
        .collect()
    }
}
