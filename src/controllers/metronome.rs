//! Metronome start/stop, tempo and bar length

use std::sync::Arc;
use tracing::info;

use super::reported;
use crate::client::{ClientError, StatusService};
use crate::engine::{EngineHandle, Intent};

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 208;
pub const MIN_BEATS: u8 = 2;
pub const MAX_BEATS: u8 = 8;

#[derive(Clone)]
pub struct MetronomeController {
    client: Arc<dyn StatusService>,
    engine: EngineHandle,
}

impl MetronomeController {
    pub fn new(client: Arc<dyn StatusService>, engine: EngineHandle) -> Self {
        Self { client, engine }
    }

    pub async fn start(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "metronome.start",
            self.client.start_metronome().await,
        )?;
        info!("▶️  Metronome started");
        self.engine.intent(Intent::MetronomeStarted);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "metronome.stop",
            self.client.stop_metronome().await,
        )?;
        info!("⏹️  Metronome stopped");
        self.engine.intent(Intent::MetronomeStopped);
        Ok(())
    }

    /// Returns the tempo the device accepted
    pub async fn set_bpm(&self, bpm: u32) -> Result<u32, ClientError> {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        let response = reported(&self.engine, "metronome.bpm", self.client.set_bpm(bpm).await)?;
        info!("🎵 BPM set to {}", response.bpm);
        Ok(response.bpm)
    }

    /// Returns the beats per bar the device accepted
    pub async fn set_time_signature(&self, beats: u8) -> Result<u8, ClientError> {
        let beats = beats.clamp(MIN_BEATS, MAX_BEATS);
        let response = reported(
            &self.engine,
            "metronome.time_signature",
            self.client.set_time_signature(beats).await,
        )?;
        info!("🎵 Time signature set to {} beats", response.time_signature);
        Ok(response.time_signature)
    }
}
