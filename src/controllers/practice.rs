//! Practice timer

use std::sync::Arc;
use tracing::info;

use super::reported;
use crate::client::{ClientError, PracticeHistory, StatusService};
use crate::engine::EngineHandle;

#[derive(Clone)]
pub struct PracticeController {
    client: Arc<dyn StatusService>,
    engine: EngineHandle,
}

impl PracticeController {
    pub fn new(client: Arc<dyn StatusService>, engine: EngineHandle) -> Self {
        Self { client, engine }
    }

    /// Clear the accumulated total and past sessions on the device
    pub async fn reset(&self) -> Result<(), ClientError> {
        reported(
            &self.engine,
            "practice.reset",
            self.client.reset_practice().await,
        )?;
        info!("🔄 Practice timer reset");
        Ok(())
    }

    pub async fn history(&self) -> Result<PracticeHistory, ClientError> {
        reported(
            &self.engine,
            "practice.history",
            self.client.practice_history().await,
        )
    }
}
