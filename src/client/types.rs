//! Wire types for the device status/control API
//!
//! The status record is decoded leniently: a subsystem sub-record that is
//! absent or malformed becomes `None`, which the engine treats as
//! "subsystem inactive".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Aggregate status returned by `GET /status`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StatusRecord {
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub time_signature: Option<u8>,
    #[serde(default)]
    pub running: Option<bool>,
    /// 1-indexed beat within the bar, `None` when stopped
    #[serde(default)]
    pub current_beat: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub practice: Option<PracticeStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub tracking: Option<TrackingStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub recording: Option<RecordingStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub midi: Option<MidiStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PracticeStatus {
    /// Seconds in the running session
    pub current_session: f64,
    /// Accumulated seconds including the running session
    pub total: f64,
    pub session_count: u32,
    #[serde(default)]
    pub midi_paused: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackingStatus {
    pub enabled: bool,
    #[serde(default)]
    pub hands_detected: bool,
    #[serde(default)]
    pub num_wrists: u32,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

impl Default for TrackingStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            hands_detected: false,
            num_wrists: 0,
            smoothing: default_smoothing(),
        }
    }
}

/// Recorder state as reported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Saving,
}

impl RecordingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Saving => "saving",
        }
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecordingStatus {
    pub state: RecordingState,
    #[serde(default)]
    pub elapsed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MidiStatus {
    pub enabled: bool,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub last_note: Option<u8>,
    #[serde(default)]
    pub last_note_name: String,
    #[serde(default)]
    pub last_velocity: u8,
    /// Body yaw in degrees
    #[serde(default)]
    pub body_yaw: f64,
    #[serde(default)]
    pub notes_count: u64,
    #[serde(default)]
    pub amplitude: f64,
}

/// Response of `POST /bpm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BpmResponse {
    pub bpm: u32,
}

/// Response of `POST /time_signature`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeSignatureResponse {
    pub time_signature: u8,
}

/// Response of `POST /recording/start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordingStartResponse {
    pub recording: bool,
    pub state: RecordingState,
}

/// Response of `POST /midi/start`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiStartResponse {
    pub enabled: bool,
    #[serde(default)]
    pub port: String,
}

/// One persisted recording, as listed by `GET /recording/list`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecordingFile {
    pub filename: String,
    pub size_mb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub(crate) struct RecordingList {
    #[serde(default)]
    pub files: Vec<RecordingFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub(crate) struct PortList {
    #[serde(default)]
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub(crate) struct DeleteResponse {
    #[serde(default)]
    pub deleted: bool,
}

/// One finished practice session
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PracticeSession {
    /// Seconds
    pub duration: f64,
    pub bpm: u32,
    pub time_signature: u8,
}

/// Response of `GET /practice/history`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PracticeHistory {
    #[serde(default)]
    pub sessions: Vec<PracticeSession>,
    #[serde(default)]
    pub total: f64,
}

fn default_smoothing() -> f64 {
    0.35
}

/// Decode a sub-record, mapping anything unusable to `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_status_decodes() {
        let record: StatusRecord = serde_json::from_value(json!({
            "bpm": 120,
            "time_signature": 4,
            "current_beat": 2,
            "running": true,
            "practice": {"current_session": 12.5, "total": 80.0, "session_count": 2},
            "tracking": {"enabled": true, "hands_detected": true, "num_wrists": 2, "smoothing": 0.4},
            "recording": {"state": "recording", "elapsed": 3.2},
            "midi": {
                "enabled": true, "port": "Keys", "last_note": 60, "last_note_name": "C4",
                "last_velocity": 90, "body_yaw": -4.5, "notes_count": 17, "amplitude": 0.8
            }
        }))
        .unwrap();

        assert_eq!(record.bpm, Some(120));
        assert_eq!(record.current_beat, Some(2));
        assert!(!record.practice.as_ref().unwrap().midi_paused);
        assert_eq!(record.tracking.as_ref().unwrap().num_wrists, 2);
        assert_eq!(record.recording.as_ref().unwrap().state, RecordingState::Recording);
        assert_eq!(record.midi.as_ref().unwrap().last_note_name, "C4");
    }

    #[test]
    fn test_malformed_sub_record_is_inactive() {
        let record: StatusRecord = serde_json::from_value(json!({
            "bpm": 90,
            "current_beat": null,
            "tracking": "broken",
            "recording": {"state": "exploding"},
            "midi": {"enabled": "yes"}
        }))
        .unwrap();

        assert_eq!(record.bpm, Some(90));
        assert_eq!(record.current_beat, None);
        assert!(record.tracking.is_none());
        assert!(record.recording.is_none());
        assert!(record.midi.is_none());
        assert!(record.practice.is_none());
    }

    #[test]
    fn test_tracking_default_smoothing() {
        let tracking: TrackingStatus = serde_json::from_value(json!({"enabled": false})).unwrap();
        assert_eq!(tracking.smoothing, 0.35);
    }
}
