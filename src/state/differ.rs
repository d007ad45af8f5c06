//! SnapshotDiffer - change-only reconciliation of a status record into the view
//!
//! For every tracked field the differ compares the freshly reported value
//! with the [`SnapshotCache`] entry. Only a change produces a view write, and
//! the cache is updated in the same step, so feeding the same record twice
//! writes nothing the second time.
//!
//! Compound subsystems (tracking, MIDI) get edge handling on their `enabled`
//! flag: when it flips off, detail fields are forced to placeholders and
//! their cache entries are dropped, so a later re-enable redraws them.

use tracing::trace;

use super::cache::SnapshotCache;
use super::types::{Field, Scalar};
use crate::client::{MidiStatus, PracticeStatus, RecordingState, StatusRecord, TrackingStatus};
use crate::view::format::{
    beat_markers, format_angle, format_duration, format_on_off, format_ratio,
    format_time_signature, format_yes_no,
};
use crate::view::{ViewSink, ViewUpdate};

/// Bar length assumed until the device reports one
pub const DEFAULT_BEATS_PER_BAR: u8 = 4;

/// Borrowing view over the session cache and the view sink for one pass
pub struct SnapshotDiffer<'a> {
    cache: &'a mut SnapshotCache,
    view: &'a mut dyn ViewSink,
    writes: usize,
}

impl<'a> SnapshotDiffer<'a> {
    pub fn new(cache: &'a mut SnapshotCache, view: &'a mut dyn ViewSink) -> Self {
        Self {
            cache,
            view,
            writes: 0,
        }
    }

    /// View writes performed by this differ so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Reconcile every subsystem of `record` except recording, which is
    /// driven by the recording lifecycle (see [`Self::show_recording`]).
    ///
    /// Returns the number of view writes of this call.
    pub fn reconcile(&mut self, record: &StatusRecord) -> usize {
        let before = self.writes;

        self.metronome(record);
        if let Some(practice) = &record.practice {
            self.practice(practice);
        }
        self.tracking(record.tracking.as_ref());
        self.midi(record.midi.as_ref());

        self.writes - before
    }

    /// Diff one field; write `render()` to the view if it changed
    pub fn set(&mut self, field: Field, value: Scalar, render: impl FnOnce() -> String) -> bool {
        if !self.cache.update(field, value) {
            return false;
        }
        let text = render();
        trace!("{} -> {}", field, text);
        self.write(ViewUpdate::text(field, text));
        true
    }

    fn write(&mut self, update: ViewUpdate) {
        self.writes += 1;
        self.view.apply(update);
    }

    fn metronome(&mut self, record: &StatusRecord) {
        if let Some(bpm) = record.bpm {
            self.set(Field::Bpm, Scalar::Int(bpm as i64), || bpm.to_string());
        }

        let bar_changed = match record.time_signature {
            Some(beats) => self.set(Field::TimeSignature, Scalar::Int(beats as i64), || {
                format_time_signature(beats)
            }),
            None => false,
        };

        if let Some(running) = record.running {
            self.set(Field::Running, Scalar::Bool(running), || {
                if running { "running" } else { "stopped" }.to_string()
            });
        }

        // A stopped metronome has no active beat, whatever the device echoes
        let beat = if record.running == Some(false) {
            None
        } else {
            record.current_beat
        };
        let beat_changed = self
            .cache
            .update(Field::CurrentBeat, beat.map(i64::from).into());

        if bar_changed || beat_changed {
            self.redraw_beats();
        }
    }

    fn redraw_beats(&mut self) {
        let beats = self
            .cache
            .get(Field::TimeSignature)
            .and_then(Scalar::as_int)
            .map(|n| n.clamp(1, u8::MAX as i64) as u8)
            .unwrap_or(DEFAULT_BEATS_PER_BAR);
        let current = self
            .cache
            .get(Field::CurrentBeat)
            .and_then(Scalar::as_int)
            .map(|n| n.clamp(0, u8::MAX as i64) as u8);
        self.write(ViewUpdate::Beats {
            markers: beat_markers(beats, current),
        });
    }

    fn practice(&mut self, practice: &PracticeStatus) {
        let PracticeStatus {
            current_session,
            total,
            session_count,
            midi_paused,
        } = *practice;

        self.set(Field::PracticeSession, Scalar::Float(current_session), || {
            format_duration(current_session)
        });
        self.set(Field::PracticeTotal, Scalar::Float(total), || {
            format_duration(total)
        });
        self.set(
            Field::PracticeSessionCount,
            Scalar::Int(session_count as i64),
            || session_count.to_string(),
        );
        self.set(Field::MidiPaused, Scalar::Bool(midi_paused), || {
            if midi_paused { "paused" } else { "counting" }.to_string()
        });
    }

    fn tracking(&mut self, tracking: Option<&TrackingStatus>) {
        if let Some(t) = tracking {
            self.set(Field::Smoothing, Scalar::Float(t.smoothing), || {
                format_ratio(t.smoothing)
            });
        }

        let enabled = tracking.is_some_and(|t| t.enabled);
        self.enabled_edge(Field::TrackingEnabled, enabled, Field::TRACKING_DETAILS);

        // Details are diffed in the same pass that sees `enabled` flip on.
        // The disable edge cleared their cache entries, so the first values
        // written here are the same ones a following tick would write.
        if let Some(t) = tracking.filter(|t| t.enabled) {
            self.set(Field::HandsDetected, Scalar::Bool(t.hands_detected), || {
                format_yes_no(t.hands_detected)
            });
            self.set(Field::NumWrists, Scalar::Int(t.num_wrists as i64), || {
                t.num_wrists.to_string()
            });
        }
    }

    fn midi(&mut self, midi: Option<&MidiStatus>) {
        if let Some(m) = midi {
            self.set(Field::Amplitude, Scalar::Float(m.amplitude), || {
                format_ratio(m.amplitude)
            });
        }

        let enabled = midi.is_some_and(|m| m.enabled);
        self.enabled_edge(Field::MidiEnabled, enabled, Field::MIDI_DETAILS);

        // Same-pass detail diff, as for tracking
        if let Some(m) = midi.filter(|m| m.enabled) {
            let note = if m.last_note.is_none() || m.last_note_name.is_empty() {
                "--".to_string()
            } else {
                m.last_note_name.clone()
            };
            self.set(Field::LastNote, Scalar::Text(note.clone()), || note);
            self.set(Field::LastVelocity, Scalar::Int(m.last_velocity as i64), || {
                m.last_velocity.to_string()
            });
            self.set(Field::BodyYaw, Scalar::Float(m.body_yaw), || {
                format_angle(m.body_yaw)
            });
            self.set(Field::NotesCount, Scalar::Int(m.notes_count as i64), || {
                m.notes_count.to_string()
            });
        }
    }

    /// Diff an `enabled` flag; on a flip to off, reset its detail fields
    fn enabled_edge(&mut self, field: Field, enabled: bool, details: &[(Field, &'static str)]) {
        let changed = self.set(field, Scalar::Bool(enabled), || format_on_off(enabled));
        if changed && !enabled {
            for (detail, placeholder) in details {
                self.cache.clear(*detail);
                self.write(ViewUpdate::text(*detail, *placeholder));
            }
        }
    }

    /// Recording state and elapsed time as seen by the local lifecycle.
    ///
    /// Elapsed follows the device only while recording, reads zero when idle
    /// and stays frozen while saving.
    pub fn show_recording(&mut self, state: RecordingState, elapsed: f64) {
        self.set(
            Field::RecordingState,
            Scalar::Text(state.as_str().to_string()),
            || state.as_str().to_string(),
        );
        match state {
            RecordingState::Recording => {
                self.set(Field::RecordingElapsed, Scalar::Float(elapsed), || {
                    format_duration(elapsed)
                });
            }
            RecordingState::Idle => {
                self.set(Field::RecordingElapsed, Scalar::Float(0.0), || {
                    format_duration(0.0)
                });
            }
            RecordingState::Saving => {}
        }
    }

    /// Local projection of a confirmed metronome start/stop
    pub fn show_metronome_running(&mut self, running: bool) {
        self.set(Field::Running, Scalar::Bool(running), || {
            if running { "running" } else { "stopped" }.to_string()
        });
        if !running && self.cache.update(Field::CurrentBeat, Scalar::Null) {
            self.redraw_beats();
        }
    }

    /// Local projection of a confirmed tracking start/stop
    pub fn show_tracking_enabled(&mut self, enabled: bool) {
        self.enabled_edge(Field::TrackingEnabled, enabled, Field::TRACKING_DETAILS);
    }

    /// Local projection of a confirmed MIDI connect/disconnect
    pub fn show_midi_enabled(&mut self, enabled: bool) {
        self.enabled_edge(Field::MidiEnabled, enabled, Field::MIDI_DETAILS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::CollectingView;
    use proptest::prelude::*;

    fn full_record() -> StatusRecord {
        StatusRecord {
            bpm: Some(120),
            time_signature: Some(4),
            running: Some(true),
            current_beat: Some(2),
            practice: Some(PracticeStatus {
                current_session: 75.4,
                total: 3725.0,
                session_count: 3,
                midi_paused: false,
            }),
            tracking: Some(TrackingStatus {
                enabled: true,
                hands_detected: true,
                num_wrists: 2,
                smoothing: 0.35,
            }),
            recording: None,
            midi: Some(MidiStatus {
                enabled: true,
                port: "Keys".to_string(),
                last_note: Some(60),
                last_note_name: "C4".to_string(),
                last_velocity: 100,
                body_yaw: 12.34,
                notes_count: 42,
                amplitude: 0.5,
            }),
        }
    }

    fn reconcile(cache: &mut SnapshotCache, view: &mut CollectingView, record: &StatusRecord) -> usize {
        SnapshotDiffer::new(cache, view).reconcile(record)
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let record = full_record();

        let first = reconcile(&mut cache, &mut view, &record);
        assert!(first > 0);
        assert_eq!(first, view.len());

        let second = reconcile(&mut cache, &mut view, &record);
        assert_eq!(second, 0);
        assert_eq!(view.len(), first);
    }

    #[test]
    fn test_cache_converges_to_record() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let record = full_record();

        for _ in 0..3 {
            reconcile(&mut cache, &mut view, &record);
        }

        assert_eq!(cache.get(Field::Bpm), Some(&Scalar::Int(120)));
        assert_eq!(cache.get(Field::TimeSignature), Some(&Scalar::Int(4)));
        assert_eq!(cache.get(Field::Running), Some(&Scalar::Bool(true)));
        assert_eq!(cache.get(Field::CurrentBeat), Some(&Scalar::Int(2)));
        assert_eq!(cache.get(Field::PracticeSession), Some(&Scalar::Float(75.4)));
        assert_eq!(cache.get(Field::PracticeTotal), Some(&Scalar::Float(3725.0)));
        assert_eq!(cache.get(Field::PracticeSessionCount), Some(&Scalar::Int(3)));
        assert_eq!(cache.get(Field::NumWrists), Some(&Scalar::Int(2)));
        assert_eq!(cache.get(Field::Smoothing), Some(&Scalar::Float(0.35)));
        assert_eq!(cache.get(Field::LastNote), Some(&Scalar::Text("C4".into())));
        assert_eq!(cache.get(Field::BodyYaw), Some(&Scalar::Float(12.34)));
        assert_eq!(cache.get(Field::NotesCount), Some(&Scalar::Int(42)));
    }

    #[test]
    fn test_formatting_of_written_fields() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        reconcile(&mut cache, &mut view, &full_record());

        assert_eq!(view.last_text(Field::PracticeSession).as_deref(), Some("01:15"));
        assert_eq!(view.last_text(Field::PracticeTotal).as_deref(), Some("1:02:05"));
        assert_eq!(view.last_text(Field::PracticeSessionCount).as_deref(), Some("3"));
        assert_eq!(view.last_text(Field::BodyYaw).as_deref(), Some("12.3°"));
        assert_eq!(view.last_text(Field::TimeSignature).as_deref(), Some("4/4"));
        assert_eq!(view.last_text(Field::HandsDetected).as_deref(), Some("yes"));

        let beats = view.last_beats().unwrap();
        assert_eq!(beats.len(), 4);
        assert!(beats[1].active);
        assert!(beats[0].downbeat && !beats[0].active);
    }

    #[test]
    fn test_only_changed_fields_are_written() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.bpm = Some(126);
        let writes = reconcile(&mut cache, &mut view, &record);

        assert_eq!(writes, 1);
        assert_eq!(view.updates(), vec![ViewUpdate::text(Field::Bpm, "126")]);
    }

    #[test]
    fn test_beat_change_redraws_markers_once() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.current_beat = Some(3);
        assert_eq!(reconcile(&mut cache, &mut view, &record), 1);
        let beats = view.last_beats().unwrap();
        assert!(beats[2].active);
        assert!(!beats[1].active);
    }

    #[test]
    fn test_tracking_disable_resets_details() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.tracking = Some(TrackingStatus {
            enabled: false,
            hands_detected: true,
            num_wrists: 2,
            smoothing: 0.35,
        });
        reconcile(&mut cache, &mut view, &record);

        assert_eq!(view.last_text(Field::TrackingEnabled).as_deref(), Some("off"));
        assert_eq!(view.last_text(Field::HandsDetected).as_deref(), Some("--"));
        assert_eq!(view.last_text(Field::NumWrists).as_deref(), Some("0"));
        assert!(!cache.contains(Field::HandsDetected));
        assert!(!cache.contains(Field::NumWrists));

        // Steady disabled state: nothing more to write
        view.take();
        assert_eq!(reconcile(&mut cache, &mut view, &record), 0);

        // Re-enable with the same detail values redraws them as fresh
        record.tracking.as_mut().unwrap().enabled = true;
        reconcile(&mut cache, &mut view, &record);
        assert_eq!(view.last_text(Field::HandsDetected).as_deref(), Some("yes"));
        assert_eq!(view.last_text(Field::NumWrists).as_deref(), Some("2"));
    }

    #[test]
    fn test_missing_midi_record_counts_as_disconnected() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.midi = None;
        reconcile(&mut cache, &mut view, &record);

        assert_eq!(view.last_text(Field::MidiEnabled).as_deref(), Some("off"));
        assert_eq!(view.last_text(Field::LastNote).as_deref(), Some("--"));
        assert_eq!(view.last_text(Field::NotesCount).as_deref(), Some("0"));
        // Amplitude is a setting, not a detail: left as last shown
        assert_eq!(cache.get(Field::Amplitude), Some(&Scalar::Float(0.5)));
    }

    #[test]
    fn test_midi_reenable_writes_details_in_same_pass() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        record.midi.as_mut().unwrap().enabled = false;
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.midi.as_mut().unwrap().enabled = true;
        reconcile(&mut cache, &mut view, &record);
        assert_eq!(view.last_text(Field::MidiEnabled).as_deref(), Some("on"));
        assert_eq!(view.last_text(Field::LastNote).as_deref(), Some("C4"));
        assert_eq!(view.last_text(Field::NotesCount).as_deref(), Some("42"));

        // The following tick has nothing left to draw
        view.take();
        assert_eq!(reconcile(&mut cache, &mut view, &record), 0);
    }

    #[test]
    fn test_absent_practice_left_untouched() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        reconcile(&mut cache, &mut view, &record);
        view.take();

        record.practice = None;
        assert_eq!(reconcile(&mut cache, &mut view, &record), 0);
        assert_eq!(cache.get(Field::PracticeSessionCount), Some(&Scalar::Int(3)));
    }

    #[test]
    fn test_stopped_metronome_has_no_active_beat() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut record = full_record();
        record.running = Some(false);
        record.current_beat = Some(1);
        reconcile(&mut cache, &mut view, &record);

        assert_eq!(cache.get(Field::CurrentBeat), Some(&Scalar::Null));
        assert!(view.last_beats().unwrap().iter().all(|m| !m.active));
    }

    #[test]
    fn test_recording_elapsed_rules() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        let mut differ = SnapshotDiffer::new(&mut cache, &mut view);

        differ.show_recording(RecordingState::Recording, 2.0);
        differ.show_recording(RecordingState::Saving, 9.0);
        differ.show_recording(RecordingState::Saving, 10.0);
        let writes_before_idle = differ.writes();
        differ.show_recording(RecordingState::Idle, 10.0);
        assert_eq!(differ.writes(), writes_before_idle + 2);

        assert_eq!(view.last_text(Field::RecordingElapsed).as_deref(), Some("00:00"));
        assert_eq!(view.last_text(Field::RecordingState).as_deref(), Some("idle"));
    }

    #[test]
    fn test_metronome_stop_projection_clears_beat() {
        let mut cache = SnapshotCache::new();
        let mut view = CollectingView::new();
        reconcile(&mut cache, &mut view, &full_record());
        view.take();

        SnapshotDiffer::new(&mut cache, &mut view).show_metronome_running(false);

        assert_eq!(view.last_text(Field::Running).as_deref(), Some("stopped"));
        assert!(view.last_beats().unwrap().iter().all(|m| !m.active));
        assert_eq!(view.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_reconcile_is_idempotent(
            bpm in 40u32..=208,
            beats in 2u8..=8,
            beat in proptest::option::of(1u8..=8),
            running in any::<bool>(),
            tracking_on in any::<bool>(),
            wrists in 0u32..=2,
            midi_on in any::<bool>(),
            notes in 0u64..1000,
            yaw in -20.0f64..20.0,
        ) {
            let mut record = full_record();
            record.bpm = Some(bpm);
            record.time_signature = Some(beats);
            record.current_beat = beat;
            record.running = Some(running);
            record.tracking.as_mut().unwrap().enabled = tracking_on;
            record.tracking.as_mut().unwrap().num_wrists = wrists;
            record.midi.as_mut().unwrap().enabled = midi_on;
            record.midi.as_mut().unwrap().notes_count = notes;
            record.midi.as_mut().unwrap().body_yaw = yaw;

            let mut cache = SnapshotCache::new();
            let mut view = CollectingView::new();
            reconcile(&mut cache, &mut view, &record);
            prop_assert_eq!(reconcile(&mut cache, &mut view, &record), 0);
        }
    }
}
