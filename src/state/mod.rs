//! Client-side session state
//!
//! Everything here is plain data plus pure transitions; the engine actor owns
//! one instance of each for the life of the session.

pub mod activity;
pub mod cache;
pub mod differ;
pub mod recording;
pub mod types;

pub use activity::{ActivityFlags, Subsystem};
pub use cache::SnapshotCache;
pub use differ::SnapshotDiffer;
pub use recording::{LifecycleEffect, RecordingLifecycle};
pub use types::{Field, Scalar};
