//! HTTP implementation of [`StatusService`] backed by reqwest

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

use super::types::{DeleteResponse, PortList, RecordingList};
use super::{
    validate_filename, BpmResponse, ClientError, MidiStartResponse, PracticeHistory,
    RecordingFile, RecordingStartResponse, StatusRecord, StatusService, TimeSignatureResponse,
};

/// Device API client
///
/// Cheap to clone: reqwest pools connections internally.
#[derive(Clone)]
pub struct HttpStatusClient {
    base: Url,
    http: reqwest::Client,
}

impl HttpStatusClient {
    /// Create a client for the device at `base_url` (e.g. `http://reachy-mini.local:8042`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid device URL: {}", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Device URL cannot be used as a base: {}", base_url);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!("HTTP client for {} (timeout {:?})", base, timeout);
        Ok(Self { base, http })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<Bytes, ClientError> {
        let endpoint = format!("/{}", segments.join("/"));
        let mut request = self.http.request(method.clone(), self.url(segments));
        if let Some(body) = &body {
            request = request.json(body);
        }

        trace!("{} {} body={:?}", method, endpoint, body);

        let response = request.send().await.map_err(|source| ClientError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { endpoint, source })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let body = self.send(Method::GET, segments, None).await?;
        decode(segments, &body)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode {
            endpoint: format!("/{}", segments.join("/")),
            reason: e.to_string(),
        })?;
        let bytes = self.send(Method::POST, segments, Some(body)).await?;
        decode(segments, &bytes)
    }

    /// POST without a body, ignoring whatever the device answers
    async fn post_empty(&self, segments: &[&str]) -> Result<(), ClientError> {
        self.send(Method::POST, segments, None).await.map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(segments: &[&str], body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode {
        endpoint: format!("/{}", segments.join("/")),
        reason: e.to_string(),
    })
}

#[async_trait]
impl StatusService for HttpStatusClient {
    async fn status(&self) -> Result<StatusRecord, ClientError> {
        self.get_json(&["status"]).await
    }

    async fn set_bpm(&self, bpm: u32) -> Result<BpmResponse, ClientError> {
        self.post_json(&["bpm"], json!({ "bpm": bpm })).await
    }

    async fn set_time_signature(&self, beats: u8) -> Result<TimeSignatureResponse, ClientError> {
        self.post_json(&["time_signature"], json!({ "beats": beats })).await
    }

    async fn start_metronome(&self) -> Result<(), ClientError> {
        self.post_empty(&["start"]).await
    }

    async fn stop_metronome(&self) -> Result<(), ClientError> {
        self.post_empty(&["stop"]).await
    }

    async fn reset_practice(&self) -> Result<(), ClientError> {
        self.post_empty(&["practice", "reset"]).await
    }

    async fn practice_history(&self) -> Result<PracticeHistory, ClientError> {
        self.get_json(&["practice", "history"]).await
    }

    async fn start_tracking(&self) -> Result<(), ClientError> {
        self.post_empty(&["tracking", "start"]).await
    }

    async fn stop_tracking(&self) -> Result<(), ClientError> {
        self.post_empty(&["tracking", "stop"]).await
    }

    async fn set_smoothing(&self, value: f64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>(&["tracking", "smoothing"], json!({ "value": value }))
            .await
            .map(|_| ())
    }

    async fn start_recording(&self) -> Result<RecordingStartResponse, ClientError> {
        let bytes = self.send(Method::POST, &["recording", "start"], None).await?;
        decode(&["recording", "start"], &bytes)
    }

    async fn stop_recording(&self) -> Result<(), ClientError> {
        self.post_empty(&["recording", "stop"]).await
    }

    async fn list_recordings(&self) -> Result<Vec<RecordingFile>, ClientError> {
        let list: RecordingList = self.get_json(&["recording", "list"]).await?;
        Ok(list.files)
    }

    async fn download_recording(&self, filename: &str) -> Result<Bytes, ClientError> {
        validate_filename(filename)?;
        let bytes = self
            .send(Method::GET, &["recording", "download", filename], None)
            .await?;

        // A missing file is answered with 200 and a JSON error object
        if bytes.first() == Some(&b'{') {
            let error = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").cloned());
            if error.is_some() {
                return Err(ClientError::Status {
                    endpoint: format!("/recording/download/{}", filename),
                    status: 404,
                });
            }
        }
        Ok(bytes)
    }

    async fn delete_recording(&self, filename: &str) -> Result<bool, ClientError> {
        validate_filename(filename)?;
        let bytes = self
            .send(Method::DELETE, &["recording", filename], None)
            .await?;
        let response: DeleteResponse = decode(&["recording", filename], &bytes)?;
        Ok(response.deleted)
    }

    async fn midi_ports(&self) -> Result<Vec<String>, ClientError> {
        let list: PortList = self.get_json(&["midi", "ports"]).await?;
        Ok(list.ports)
    }

    async fn start_midi(&self, port_name: &str) -> Result<MidiStartResponse, ClientError> {
        self.post_json(&["midi", "start"], json!({ "port_name": port_name }))
            .await
    }

    async fn stop_midi(&self) -> Result<(), ClientError> {
        self.post_empty(&["midi", "stop"]).await
    }

    async fn set_amplitude(&self, value: f64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>(&["midi", "amplitude"], json!({ "value": value }))
            .await
            .map(|_| ())
    }
}
