//! Displayed field identifiers and the scalar values remembered for them
//!
//! Every value that the control surface shows is addressed by a [`Field`].
//! The snapshot cache stores one [`Scalar`] per field and compares new
//! values with strict equality.

use serde::{Deserialize, Serialize};

/// A single displayed field of the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Metronome
    Bpm,
    TimeSignature,
    Running,
    CurrentBeat,

    // Practice timer
    PracticeSession,
    PracticeTotal,
    PracticeSessionCount,
    MidiPaused,

    // Hand tracking
    TrackingEnabled,
    HandsDetected,
    NumWrists,
    Smoothing,

    // Recording
    RecordingState,
    RecordingElapsed,

    // MIDI
    MidiEnabled,
    LastNote,
    LastVelocity,
    BodyYaw,
    NotesCount,
    Amplitude,
}

impl Field {
    /// Detail fields of the tracking subsystem, with the placeholder shown
    /// while tracking is disabled.
    pub const TRACKING_DETAILS: &'static [(Field, &'static str)] = &[
        (Field::HandsDetected, "--"),
        (Field::NumWrists, "0"),
    ];

    /// Detail fields of the MIDI subsystem, with the placeholder shown
    /// while MIDI is disconnected.
    pub const MIDI_DETAILS: &'static [(Field, &'static str)] = &[
        (Field::LastNote, "--"),
        (Field::LastVelocity, "--"),
        (Field::BodyYaw, "--"),
        (Field::NotesCount, "0"),
    ];

    /// Stable key used in logs and the REPL status dump
    pub fn key(&self) -> &'static str {
        match self {
            Field::Bpm => "bpm",
            Field::TimeSignature => "time_signature",
            Field::Running => "running",
            Field::CurrentBeat => "current_beat",
            Field::PracticeSession => "practice.current_session",
            Field::PracticeTotal => "practice.total",
            Field::PracticeSessionCount => "practice.session_count",
            Field::MidiPaused => "practice.midi_paused",
            Field::TrackingEnabled => "tracking.enabled",
            Field::HandsDetected => "tracking.hands_detected",
            Field::NumWrists => "tracking.num_wrists",
            Field::Smoothing => "tracking.smoothing",
            Field::RecordingState => "recording.state",
            Field::RecordingElapsed => "recording.elapsed",
            Field::MidiEnabled => "midi.enabled",
            Field::LastNote => "midi.last_note",
            Field::LastVelocity => "midi.last_velocity",
            Field::BodyYaw => "midi.body_yaw",
            Field::NotesCount => "midi.notes_count",
            Field::Amplitude => "midi.amplitude",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Remembered value of a displayed field
///
/// `Null` is a real value (e.g. no current beat while stopped), distinct
/// from a field that has no cache entry at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(x) => Some(*x),
            Scalar::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}
