//! Subsystem controllers
//!
//! Each controller issues remote commands for one subsystem and reports the
//! outcome to the engine: an [`Intent`](crate::engine::Intent) on success, a
//! failed-command record otherwise. Parameter setters only talk to the device;
//! they never start or stop polling.

pub mod metronome;
pub mod midi;
pub mod practice;
pub mod recording;
pub mod tracking;


use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{ClientError, StatusService};
use crate::engine::{EngineActor, EngineHandle, EngineSettings};
use crate::view::ViewSink;

pub use metronome::MetronomeController;
pub use midi::MidiController;
pub use practice::PracticeController;
pub use recording::RecordingController;
pub use tracking::TrackingController;

/// One connected control page: the engine plus a controller per subsystem
pub struct Session {
    pub metronome: MetronomeController,
    pub practice: PracticeController,
    pub tracking: TrackingController,
    pub recording: RecordingController,
    pub midi: MidiController,
    engine: EngineHandle,
}

impl Session {
    /// Spawn the engine and wire every controller to it
    pub fn spawn(
        client: Arc<dyn StatusService>,
        view: Box<dyn ViewSink>,
        settings: EngineSettings,
    ) -> Self {
        let engine = EngineActor::spawn(Arc::clone(&client), view, settings);

        Self {
            metronome: MetronomeController::new(Arc::clone(&client), engine.clone()),
            practice: PracticeController::new(Arc::clone(&client), engine.clone()),
            tracking: TrackingController::new(Arc::clone(&client), engine.clone()),
            recording: RecordingController::new(Arc::clone(&client), engine.clone()),
            midi: MidiController::new(client, engine.clone()),
            engine,
        }
    }

    /// Initial page load: one status fetch, the recordings list and the MIDI ports.
    ///
    /// The status fetch starts polling if the device already has something
    /// active. List failures are logged and do not abort the load.
    pub async fn load(&self) {
        self.engine.poll_now().await;

        if let Err(e) = self.recording.refresh_list().await {
            warn!("Could not load recordings list: {}", e);
        }
        if let Err(e) = self.midi.refresh_ports().await {
            warn!("Could not load MIDI ports: {}", e);
        }

        info!("✅ Session loaded");
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

/// Pass a command result through, telling the engine when it failed
pub(crate) fn reported<T>(
    engine: &EngineHandle,
    action: &'static str,
    result: Result<T, ClientError>,
) -> Result<T, ClientError> {
    if let Err(e) = &result {
        engine.command_failed(action, e);
    }
    result
}

/// Clamp a slider value, mapping NaN to the lower bound
pub(crate) fn clamp_ratio(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
