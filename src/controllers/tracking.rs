//! Hand tracking

use std::sync::Arc;
use tracing::info;

use super::{clamp_ratio, reported};
use crate::client::{ClientError, StatusService};
use crate::engine::{EngineHandle, Intent};

/// Lowest smoothing the device accepts
pub const MIN_SMOOTHING: f64 = 0.05;
pub const MAX_SMOOTHING: f64 = 1.0;

#[derive(Clone)]
pub struct TrackingController {
    client: Arc<dyn StatusService>,
    engine: EngineHandle,
}

impl TrackingController {
    pub fn new(client: Arc<dyn StatusService>, engine: EngineHandle) -> Self {
        Self { client, engine }
    }

    pub async fn start(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "tracking.start",
            self.client.start_tracking().await,
        )?;
        info!("✋ Hand tracking enabled");
        self.engine.intent(Intent::TrackingStarted);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "tracking.stop",
            self.client.stop_tracking().await,
        )?;
        info!("✋ Hand tracking disabled");
        self.engine.intent(Intent::TrackingStopped);
        Ok(())
    }

    /// Returns the value sent after clamping
    pub async fn set_smoothing(&self, value: f64) -> Result<f64, ClientError> {
        let value = clamp_ratio(value, MIN_SMOOTHING, MAX_SMOOTHING);
        reported(
            &self.engine,
            "tracking.smoothing",
            self.client.set_smoothing(value).await,
        )?;
        info!("✋ Smoothing set to {:.2}", value);
        Ok(value)
    }
}
