//! View layer: what the engine writes when displayed state changes
//!
//! Rendering is out of scope for the engine. It emits [`ViewUpdate`]s to a
//! [`ViewSink`], which may print them, forward them to a UI, or just record
//! them.

pub mod format;

use colored::Colorize;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::client::RecordingFile;
use crate::state::Field;

/// One marker of the beat display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatMarker {
    /// 1-indexed beat position
    pub index: u8,
    pub active: bool,
    pub downbeat: bool,
}

/// A single view write
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Formatted text of a field
    Text { field: Field, text: String },
    /// Full beat marker row (re-rendered when the bar or the beat changes)
    Beats { markers: Vec<BeatMarker> },
    /// Persisted recordings
    Recordings { files: Vec<RecordingFile> },
    /// MIDI input ports offered by the device
    MidiPorts { ports: Vec<String> },
}

impl ViewUpdate {
    pub fn text(field: Field, text: impl Into<String>) -> Self {
        ViewUpdate::Text {
            field,
            text: text.into(),
        }
    }
}

/// Receiver of view writes
///
/// Owned by the engine task, so implementations need `Send` but not `Sync`.
pub trait ViewSink: Send {
    fn apply(&mut self, update: ViewUpdate);
}

impl<F> ViewSink for F
where
    F: FnMut(ViewUpdate) + Send,
{
    fn apply(&mut self, update: ViewUpdate) {
        self(update)
    }
}

/// Records every update; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct CollectingView {
    updates: Arc<Mutex<Vec<ViewUpdate>>>,
}

impl CollectingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates received so far
    pub fn updates(&self) -> Vec<ViewUpdate> {
        self.updates.lock().clone()
    }

    /// Number of updates received so far
    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.lock().is_empty()
    }

    /// Drain and return the updates received so far
    pub fn take(&self) -> Vec<ViewUpdate> {
        std::mem::take(&mut *self.updates.lock())
    }

    /// Latest text written to `field`
    pub fn last_text(&self, field: Field) -> Option<String> {
        self.updates.lock().iter().rev().find_map(|u| match u {
            ViewUpdate::Text { field: f, text } if *f == field => Some(text.clone()),
            _ => None,
        })
    }

    /// Latest beat marker row
    pub fn last_beats(&self) -> Option<Vec<BeatMarker>> {
        self.updates.lock().iter().rev().find_map(|u| match u {
            ViewUpdate::Beats { markers } => Some(markers.clone()),
            _ => None,
        })
    }

    /// How many recordings-list writes were received
    pub fn recordings_writes(&self) -> usize {
        self.updates
            .lock()
            .iter()
            .filter(|u| matches!(u, ViewUpdate::Recordings { .. }))
            .count()
    }
}

impl ViewSink for CollectingView {
    fn apply(&mut self, update: ViewUpdate) {
        self.updates.lock().push(update);
    }
}

/// Prints one line per update to stdout
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ConsoleView {
    pub fn new() -> Self {
        Self
    }
}

impl ViewSink for ConsoleView {
    fn apply(&mut self, update: ViewUpdate) {
        let ts = chrono::Local::now().format("%H:%M:%S%.3f");
        match update {
            ViewUpdate::Text { field, text } => {
                println!("{} {:<26} {}", ts.to_string().dimmed(), field.key().cyan(), text.bold());
            }
            ViewUpdate::Beats { markers } => {
                let row: String = markers
                    .iter()
                    .map(|m| match (m.active, m.downbeat) {
                        (true, true) => "●".red().bold().to_string(),
                        (true, false) => "●".green().bold().to_string(),
                        (false, true) => "○".red().to_string(),
                        (false, false) => "○".normal().to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{} {:<26} {}", ts.to_string().dimmed(), "beats".cyan(), row);
            }
            ViewUpdate::Recordings { files } => {
                println!("{} {}", ts.to_string().dimmed(), "recordings".cyan());
                if files.is_empty() {
                    println!("    {}", "(none)".dimmed());
                }
                for file in files {
                    println!("    {} ({:.1} MB)", file.filename, file.size_mb);
                }
            }
            ViewUpdate::MidiPorts { ports } => {
                println!("{} {}", ts.to_string().dimmed(), "midi ports".cyan());
                if ports.is_empty() {
                    println!("    {}", "(none)".dimmed());
                }
                for (i, port) in ports.iter().enumerate() {
                    println!("    [{}] {}", i, port);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_view_shares_log() {
        let view = CollectingView::new();
        let mut sink = view.clone();
        sink.apply(ViewUpdate::text(Field::Bpm, "120"));
        sink.apply(ViewUpdate::text(Field::Bpm, "140"));

        assert_eq!(view.len(), 2);
        assert_eq!(view.last_text(Field::Bpm).as_deref(), Some("140"));
        assert_eq!(view.last_text(Field::Running), None);

        assert_eq!(view.take().len(), 2);
        assert!(view.is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = 0;
        {
            let mut sink = |_: ViewUpdate| seen += 1;
            sink.apply(ViewUpdate::MidiPorts { ports: vec![] });
        }
        assert_eq!(seen, 1);
    }
}
