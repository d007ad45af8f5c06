//! Remote status/control client
//!
//! The device owns metronome timing, motion, audio, hand tracking, MIDI I/O
//! and recording persistence. This module only issues requests: one aggregate
//! status read plus one call per subsystem command. No business logic lives
//! here.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use http::HttpStatusClient;
pub use types::{
    BpmResponse, MidiStartResponse, MidiStatus, PracticeHistory, PracticeSession, PracticeStatus,
    RecordingFile, RecordingStartResponse, RecordingState, RecordingStatus, StatusRecord,
    TimeSignatureResponse, TrackingStatus,
};

/// Failure talking to the device
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure (connection refused, timeout, ...)
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The device answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body could not be decoded into the expected shape
    #[error("invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// A recording filename that cannot be addressed safely
    #[error("invalid recording filename: {0:?}")]
    InvalidFilename(String),
}

/// Request/response contract of the device API
///
/// All methods take `&self` so the client can be shared as
/// `Arc<dyn StatusService>` between the engine and the controllers.
#[async_trait]
pub trait StatusService: Send + Sync {
    /// `GET /status`
    async fn status(&self) -> Result<StatusRecord, ClientError>;

    // Metronome
    async fn set_bpm(&self, bpm: u32) -> Result<BpmResponse, ClientError>;
    async fn set_time_signature(&self, beats: u8) -> Result<TimeSignatureResponse, ClientError>;
    async fn start_metronome(&self) -> Result<(), ClientError>;
    async fn stop_metronome(&self) -> Result<(), ClientError>;

    // Practice timer
    async fn reset_practice(&self) -> Result<(), ClientError>;
    async fn practice_history(&self) -> Result<PracticeHistory, ClientError>;

    // Hand tracking
    async fn start_tracking(&self) -> Result<(), ClientError>;
    async fn stop_tracking(&self) -> Result<(), ClientError>;
    async fn set_smoothing(&self, value: f64) -> Result<(), ClientError>;

    // Recording
    async fn start_recording(&self) -> Result<RecordingStartResponse, ClientError>;
    async fn stop_recording(&self) -> Result<(), ClientError>;
    async fn list_recordings(&self) -> Result<Vec<RecordingFile>, ClientError>;
    async fn download_recording(&self, filename: &str) -> Result<Bytes, ClientError>;
    async fn delete_recording(&self, filename: &str) -> Result<bool, ClientError>;

    // MIDI
    async fn midi_ports(&self) -> Result<Vec<String>, ClientError>;
    async fn start_midi(&self, port_name: &str) -> Result<MidiStartResponse, ClientError>;
    async fn stop_midi(&self) -> Result<(), ClientError>;
    async fn set_amplitude(&self, value: f64) -> Result<(), ClientError>;
}

/// Reject names that would escape the recordings endpoint
pub fn validate_filename(filename: &str) -> Result<(), ClientError> {
    let bad = filename.is_empty()
        || filename == "."
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\');
    if bad {
        return Err(ClientError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("practice_20240101_120000.mp4").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("a/b.mp4").is_err());
        assert!(validate_filename("a\\b.mp4").is_err());
    }

    #[test]
    fn test_error_messages_name_endpoint() {
        let err = ClientError::Status {
            endpoint: "/status".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "/status returned HTTP 503");
    }
}
