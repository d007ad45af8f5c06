//! MIDI input: port selection, connect/disconnect, motion amplitude

use std::sync::Arc;
use tracing::{info, warn};

use super::{clamp_ratio, reported};
use crate::client::{ClientError, StatusService};
use crate::engine::{EngineHandle, Intent};

#[derive(Clone)]
pub struct MidiController {
    client: Arc<dyn StatusService>,
    engine: EngineHandle,
}

impl MidiController {
    pub fn new(client: Arc<dyn StatusService>, engine: EngineHandle) -> Self {
        Self { client, engine }
    }

    /// Fetch the device's MIDI input ports and show them
    pub async fn refresh_ports(&self) -> Result<Vec<String>, ClientError> {
        let ports = reported(&self.engine, "midi.ports", self.client.midi_ports().await)?;
        self.engine.show_midi_ports(ports.clone());
        Ok(ports)
    }

    /// Open `port` on the device. Returns whether the port opened.
    pub async fn connect(&self, port: &str) -> Result<bool, ClientError> {
        let response = reported(&self.engine, "midi.connect", self.client.start_midi(port).await)?;

        if response.enabled {
            info!("🎹 MIDI connected: {}", response.port);
            self.engine.intent(Intent::MidiConnected);
        } else {
            warn!("Device could not open MIDI port '{}'", port);
        }
        Ok(response.enabled)
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        reported(&self.engine, "midi.disconnect", self.client.stop_midi().await)?;
        info!("🎹 MIDI disconnected");
        self.engine.intent(Intent::MidiDisconnected);
        Ok(())
    }

    /// Returns the value sent after clamping to 0..=1
    pub async fn set_amplitude(&self, value: f64) -> Result<f64, ClientError> {
        let value = clamp_ratio(value, 0.0, 1.0);
        reported(
            &self.engine,
            "midi.amplitude",
            self.client.set_amplitude(value).await,
        )?;
        info!("🎹 Amplitude set to {:.2}", value);
        Ok(value)
    }
}
