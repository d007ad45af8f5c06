//! PollLifecycleManager - the single recurring poll timer
//!
//! At most one timer task exists at a time. `start` while running and `stop`
//! while stopped are both no-ops, so any number of controllers may ask for
//! polling without coordinating.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Called on every timer tick
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

pub struct PollLifecycleManager {
    interval: Duration,
    on_tick: TickCallback,
    handle: Option<JoinHandle<()>>,
    /// Timers created over the session
    started: u64,
}

impl PollLifecycleManager {
    pub fn new(interval: Duration, on_tick: TickCallback) -> Self {
        Self {
            interval,
            on_tick,
            handle: None,
            started: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of timers created since construction
    pub fn timers_started(&self) -> u64 {
        self.started
    }

    /// Start the timer unless one already exists.
    ///
    /// The first tick fires one interval after the start. Returns true if a
    /// timer was created.
    pub fn start(&mut self) -> bool {
        if self.handle.is_some() {
            return false;
        }

        let period = self.interval;
        let on_tick = Arc::clone(&self.on_tick);
        self.handle = Some(tokio::spawn(async move {
            let first = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                on_tick();
            }
        }));
        self.started += 1;

        info!("▶️  Polling started (every {:?})", self.interval);
        true
    }

    /// Cancel the timer and forget its handle. Returns true if one was running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                info!("⏸️  Polling stopped");
                true
            }
            None => {
                debug!("Poll stop requested with no timer running");
                false
            }
        }
    }
}

impl Drop for PollLifecycleManager {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
