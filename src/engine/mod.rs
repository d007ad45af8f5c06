//! Reconciliation engine
//!
//! - `actor`: owns cache, recording lifecycle, activity flags and the poll timer
//! - `handle`: cloneable front end used by controllers and the CLI
//! - `poll`: the single recurring timer
//! - `commands`: messages and snapshots exchanged with the actor

pub mod actor;
pub mod commands;
pub mod handle;
pub mod poll;


pub use actor::{EngineActor, EngineSettings};
pub use commands::{EngineCommand, EngineSnapshot, Intent};
pub use handle::EngineHandle;
pub use poll::PollLifecycleManager;
