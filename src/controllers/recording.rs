//! Video recording and the persisted recordings list
//!
//! Starting is confirmed by the device's answer; stopping only requests the
//! save, and its completion is observed by polling (see
//! [`RecordingLifecycle`](crate::state::RecordingLifecycle)).

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::reported;
use crate::client::{ClientError, RecordingFile, StatusService};
use crate::engine::{EngineHandle, Intent};

#[derive(Clone)]
pub struct RecordingController {
    client: Arc<dyn StatusService>,
    engine: EngineHandle,
}

impl RecordingController {
    pub fn new(client: Arc<dyn StatusService>, engine: EngineHandle) -> Self {
        Self { client, engine }
    }

    /// Ask the device to start recording.
    ///
    /// Returns whether it actually started; a refusal (camera busy, already
    /// recording) leaves the local lifecycle as it is.
    pub async fn start(&self) -> Result<bool, ClientError> {
        let response = reported(
            &self.engine,
            "recording.start",
            self.client.start_recording().await,
        )?;

        if response.recording {
            info!("⏺️  Recording started");
            self.engine.intent(Intent::RecordingStarted);
        } else {
            warn!("Device did not start recording (state: {})", response.state);
        }
        Ok(response.recording)
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "recording.stop",
            self.client.stop_recording().await,
        )?;
        info!("💾 Recording stopped, saving...");
        self.engine.intent(Intent::RecordingStopRequested);
        Ok(())
    }

    /// Fetch the recordings list and show it
    pub async fn refresh_list(&self) -> Result<Vec<RecordingFile>, ClientError> {
        let files = reported(
            &self.engine,
            "recording.list",
            self.client.list_recordings().await,
        )?;
        self.engine.show_recordings(files.clone());
        Ok(files)
    }

    /// Download `filename` into `dir`, creating it if needed
    pub async fn download(&self, filename: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        let bytes = reported(
            &self.engine,
            "recording.download",
            self.client.download_recording(filename).await,
        )?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create download directory: {}", dir.display()))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write recording: {}", path.display()))?;

        info!("⬇️  Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Delete a recording on the device, then reload the list
    pub async fn delete(&self, filename: &str) -> Result<bool, ClientError> {
        let deleted = reported(
            &self.engine,
            "recording.delete",
            self.client.delete_recording(filename).await,
        )?;

        if deleted {
            info!("🗑️  Deleted {}", filename);
        } else {
            warn!("Recording not found on device: {}", filename);
        }

        self.refresh_list().await?;
        Ok(deleted)
    }
}
