//! Metronome console - client-side state reconciliation for a robot metronome
//!
//! The device is authoritative for everything it does (timing, motion,
//! tracking, MIDI, recording). This crate polls its aggregate status while
//! anything is active, diffs each record against the last displayed values
//! and writes only what changed to a [`view::ViewSink`].
//!
//! - [`client`]: HTTP request/response contract of the device
//! - [`state`]: snapshot cache, differ, recording lifecycle, activity flags
//! - [`engine`]: the actor that owns session state and the poll timer
//! - [`controllers`]: per-subsystem user commands
//! - [`view`]: view updates, formatting and sinks
//! - [`config`]: YAML configuration

pub mod client;
pub mod config;
pub mod controllers;
pub mod engine;
pub mod state;
pub mod view;
