//! Scripted in-memory device used by engine and controller tests

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use super::{
    BpmResponse, ClientError, MidiStartResponse, PracticeHistory, RecordingFile,
    RecordingStartResponse, RecordingState, StatusRecord, StatusService, TimeSignatureResponse,
};

#[derive(Default)]
struct Inner {
    /// Records served in order; the last one repeats once the queue drains
    statuses: VecDeque<StatusRecord>,
    last_status: StatusRecord,
    calls: HashMap<&'static str, usize>,
    failing: HashSet<&'static str>,
    recordings: Vec<RecordingFile>,
    ports: Vec<String>,
    midi_opens: bool,
    recording_start: Option<RecordingStartResponse>,
    /// Latency of `/status`, counted from the call
    status_delay: Option<Duration>,
}

pub(crate) struct FakeService {
    inner: Mutex<Inner>,
}

impl FakeService {
    pub fn new() -> Self {
        let inner = Inner {
            midi_opens: true,
            ..Default::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn push_status(&self, record: StatusRecord) {
        self.inner.lock().statuses.push_back(record);
    }

    pub fn set_status(&self, record: StatusRecord) {
        let mut inner = self.inner.lock();
        inner.statuses.clear();
        inner.last_status = record;
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.inner.lock().failing.insert(endpoint);
    }

    pub fn set_recordings(&self, files: Vec<RecordingFile>) {
        self.inner.lock().recordings = files;
    }

    pub fn set_ports(&self, ports: Vec<String>) {
        self.inner.lock().ports = ports;
    }

    pub fn set_midi_opens(&self, opens: bool) {
        self.inner.lock().midi_opens = opens;
    }

    pub fn set_recording_start(&self, response: RecordingStartResponse) {
        self.inner.lock().recording_start = Some(response);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        self.inner.lock().status_delay = Some(delay);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.inner.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    fn hit(&self, endpoint: &'static str) -> Result<(), ClientError> {
        let mut inner = self.inner.lock();
        *inner.calls.entry(endpoint).or_insert(0) += 1;
        if inner.failing.contains(endpoint) {
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StatusService for FakeService {
    async fn status(&self) -> Result<StatusRecord, ClientError> {
        self.hit("/status")?;
        let delay = self.inner.lock().status_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock();
        if let Some(next) = inner.statuses.pop_front() {
            inner.last_status = next;
        }
        Ok(inner.last_status.clone())
    }

    async fn set_bpm(&self, bpm: u32) -> Result<BpmResponse, ClientError> {
        self.hit("/bpm")?;
        Ok(BpmResponse { bpm })
    }

    async fn set_time_signature(&self, beats: u8) -> Result<TimeSignatureResponse, ClientError> {
        self.hit("/time_signature")?;
        Ok(TimeSignatureResponse {
            time_signature: beats,
        })
    }

    async fn start_metronome(&self) -> Result<(), ClientError> {
        self.hit("/start")
    }

    async fn stop_metronome(&self) -> Result<(), ClientError> {
        self.hit("/stop")
    }

    async fn reset_practice(&self) -> Result<(), ClientError> {
        self.hit("/practice/reset")
    }

    async fn practice_history(&self) -> Result<PracticeHistory, ClientError> {
        self.hit("/practice/history")?;
        Ok(PracticeHistory::default())
    }

    async fn start_tracking(&self) -> Result<(), ClientError> {
        self.hit("/tracking/start")
    }

    async fn stop_tracking(&self) -> Result<(), ClientError> {
        self.hit("/tracking/stop")
    }

    async fn set_smoothing(&self, _value: f64) -> Result<(), ClientError> {
        self.hit("/tracking/smoothing")
    }

    async fn start_recording(&self) -> Result<RecordingStartResponse, ClientError> {
        self.hit("/recording/start")?;
        Ok(self.inner.lock().recording_start.unwrap_or(RecordingStartResponse {
            recording: true,
            state: RecordingState::Recording,
        }))
    }

    async fn stop_recording(&self) -> Result<(), ClientError> {
        self.hit("/recording/stop")
    }

    async fn list_recordings(&self) -> Result<Vec<RecordingFile>, ClientError> {
        self.hit("/recording/list")?;
        Ok(self.inner.lock().recordings.clone())
    }

    async fn download_recording(&self, filename: &str) -> Result<Bytes, ClientError> {
        super::validate_filename(filename)?;
        self.hit("/recording/download")?;
        Ok(Bytes::from(format!("video:{}", filename)))
    }

    async fn delete_recording(&self, filename: &str) -> Result<bool, ClientError> {
        super::validate_filename(filename)?;
        self.hit("/recording/delete")?;
        let mut inner = self.inner.lock();
        let before = inner.recordings.len();
        inner.recordings.retain(|f| f.filename != filename);
        Ok(inner.recordings.len() != before)
    }

    async fn midi_ports(&self) -> Result<Vec<String>, ClientError> {
        self.hit("/midi/ports")?;
        Ok(self.inner.lock().ports.clone())
    }

    async fn start_midi(&self, port_name: &str) -> Result<MidiStartResponse, ClientError> {
        self.hit("/midi/start")?;
        let enabled = self.inner.lock().midi_opens;
        Ok(MidiStartResponse {
            enabled,
            port: if enabled { port_name.to_string() } else { String::new() },
        })
    }

    async fn stop_midi(&self) -> Result<(), ClientError> {
        self.hit("/midi/stop")
    }

    async fn set_amplitude(&self, _value: f64) -> Result<(), ClientError> {
        self.hit("/midi/amplitude")
    }
}
