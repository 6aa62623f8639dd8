//! Progression scheduler (spec §4.11, properties 10).
//!
//! Poll-driven rather than timer-driven: `play()` flattens a realised
//! progression into a queue of future-timestamped note events, and
//! `tick(now, sink)` drains whatever has come due. This mirrors the
//! teacher's `MusicEngine::tick(dt, now_sec, out_events)` cooperative
//! scheduling, generalised from a fixed probabilistic grid to an exact
//! chord-boundary schedule.

use crate::engine::voices::NoteSink;
use crate::error::EngineError;
use crate::theory::chord::Chord;
use crate::theory::pitch::Pitch;
use std::collections::{HashSet, VecDeque};

/// Gives the transport a moment to settle before the first note-on,
/// and the host time to finish any pending graph setup.
pub const SMALL_LEAD_IN_SEC: f64 = 0.05;

/// Tiny articulation gap between successive chords (spec §4.11).
pub const SMALL_GAP_SEC: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    Idle,
    Playing,
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    NoteOn,
    NoteOff,
}

#[derive(Debug, Clone, Copy)]
struct SchedulerEvent {
    time: f64,
    pitch: Pitch,
    velocity: f64,
    kind: EventKind,
    chord_index: usize,
}

const DEFAULT_VELOCITY: f64 = 0.8;

pub struct ProgressionScheduler {
    status: SchedulerStatus,
    cursor_index: usize,
    stop_requested: bool,
    queue: VecDeque<SchedulerEvent>,
    issued_pitches: HashSet<u8>,
    chords: Vec<Chord>,
    tempo_bpm: f64,
    chord_duration_beats: f64,
    loop_enabled: bool,
    next_loop_start: f64,
}

impl Default for ProgressionScheduler {
    fn default() -> Self {
        Self {
            status: SchedulerStatus::Idle,
            cursor_index: 0,
            stop_requested: false,
            queue: VecDeque::new(),
            issued_pitches: HashSet::new(),
            chords: Vec::new(),
            tempo_bpm: 120.0,
            chord_duration_beats: 1.0,
            loop_enabled: false,
            next_loop_start: 0.0,
        }
    }
}

impl ProgressionScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        self.status
    }

    #[must_use]
    pub fn cursor_index(&self) -> usize {
        self.cursor_index
    }

    pub fn play(
        &mut self,
        realised_progression: Vec<Chord>,
        tempo_bpm: f64,
        chord_duration_beats: f64,
        loop_enabled: bool,
        now: f64,
    ) -> Result<(), EngineError> {
        if self.status == SchedulerStatus::Playing {
            return Err(EngineError::ProgressionAlreadyPlaying);
        }
        self.chords = realised_progression;
        self.tempo_bpm = tempo_bpm;
        self.chord_duration_beats = chord_duration_beats;
        self.loop_enabled = loop_enabled;
        self.stop_requested = false;
        self.status = SchedulerStatus::Playing;
        self.cursor_index = 0;

        let t0 = now + SMALL_LEAD_IN_SEC;
        self.enqueue_loop_iteration(t0);
        self.next_loop_start = t0 + self.seconds_per_chord() * self.chords.len() as f64;
        Ok(())
    }

    fn seconds_per_chord(&self) -> f64 {
        60.0 * self.chord_duration_beats / self.tempo_bpm
    }

    fn enqueue_loop_iteration(&mut self, t0: f64) {
        let spc = self.seconds_per_chord();
        for (i, chord) in self.chords.iter().enumerate() {
            let on_time = t0 + i as f64 * spc;
            let off_time = t0 + (i + 1) as f64 * spc - SMALL_GAP_SEC;
            for pitch in &chord.voiced_pitches {
                self.queue.push_back(SchedulerEvent {
                    time: on_time,
                    pitch: *pitch,
                    velocity: DEFAULT_VELOCITY,
                    kind: EventKind::NoteOn,
                    chord_index: i,
                });
                self.queue.push_back(SchedulerEvent {
                    time: off_time,
                    pitch: *pitch,
                    velocity: DEFAULT_VELOCITY,
                    kind: EventKind::NoteOff,
                    chord_index: i,
                });
            }
        }
    }

    /// Drain whatever events are due at or before `now`, dispatching
    /// them to `sink`. Reschedules the next loop iteration once the
    /// current one drains, if looping and not stopped.
    pub fn tick(&mut self, now: f64, sink: &mut impl NoteSink) {
        if self.status != SchedulerStatus::Playing {
            return;
        }

        loop {
            while matches!(self.queue.front(), Some(event) if event.time <= now) {
                let event = self.queue.pop_front().expect("checked non-empty above");
                match event.kind {
                    EventKind::NoteOn => {
                        sink.note_on(event.pitch, event.velocity, event.time);
                        self.issued_pitches.insert(event.pitch.value());
                        self.cursor_index = event.chord_index;
                    }
                    EventKind::NoteOff => {
                        sink.note_off(event.pitch, event.time);
                        self.issued_pitches.remove(&event.pitch.value());
                    }
                }
            }

            if !self.queue.is_empty() {
                // Front event is due later than `now`; wait for the next tick.
                break;
            }
            if self.loop_enabled && !self.stop_requested && !self.chords.is_empty() && self.next_loop_start <= now {
                let t0 = self.next_loop_start;
                self.enqueue_loop_iteration(t0);
                self.next_loop_start = t0 + self.seconds_per_chord() * self.chords.len() as f64;
                continue;
            }
            if !self.loop_enabled || self.stop_requested {
                self.status = SchedulerStatus::Idle;
            }
            break;
        }
    }

    /// Immediately releases every pitch the scheduler has issued and
    /// not yet released, cancels all pending future events, and
    /// returns to idle. Cooperative: any timer/tick loop already in
    /// flight checks `stop_requested` before emitting further events,
    /// but this method itself performs the cancellation synchronously.
    pub fn stop(&mut self, now: f64, sink: &mut impl NoteSink) {
        self.stop_requested = true;
        self.queue.clear();
        for pitch_value in self.issued_pitches.clone() {
            if let Ok(pitch) = Pitch::new(i32::from(pitch_value)) {
                sink.note_off(pitch, now);
            }
        }
        self.issued_pitches.clear();
        self.status = SchedulerStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::chord::{build_chord, ChordQuality};

    fn p(v: i32) -> Pitch {
        Pitch::new(v).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        note_ons: Vec<(u8, f64)>,
        note_offs: Vec<(u8, f64)>,
    }

    impl NoteSink for RecordingSink {
        fn note_on(&mut self, pitch: Pitch, _velocity: f64, at_time: f64) {
            self.note_ons.push((pitch.value(), at_time));
        }
        fn note_off(&mut self, pitch: Pitch, at_time: f64) {
            self.note_offs.push((pitch.value(), at_time));
        }
    }

    fn simple_progression() -> Vec<Chord> {
        vec![
            build_chord(p(60), ChordQuality::Major, 0),
            build_chord(p(65), ChordQuality::Major, 0),
        ]
    }

    #[test]
    fn rejects_play_while_already_playing() {
        let mut scheduler = ProgressionScheduler::new();
        scheduler.play(simple_progression(), 120.0, 1.0, false, 0.0).unwrap();
        let result = scheduler.play(simple_progression(), 120.0, 1.0, false, 0.0);
        assert_eq!(result, Err(EngineError::ProgressionAlreadyPlaying));
    }

    #[test]
    fn ticking_past_every_chord_without_loop_returns_to_idle() {
        let mut scheduler = ProgressionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.play(simple_progression(), 120.0, 1.0, false, 0.0).unwrap();
        scheduler.tick(1000.0, &mut sink);
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
        assert_eq!(sink.note_ons.len(), 6); // 2 chords * 3 tones
        assert_eq!(sink.note_offs.len(), 6);
    }

    #[test]
    fn looping_progression_reschedules_and_stop_halts_future_note_ons() {
        let mut scheduler = ProgressionScheduler::new();
        let mut sink = RecordingSink::default();
        scheduler.play(simple_progression(), 120.0, 1.0, true, 0.0).unwrap();

        // Three loop iterations' worth of note-ons have come due by
        // t=3.0 (iterations start at 0.05, 1.05, 2.05; S5-style).
        let stop_time = 3.0;
        scheduler.tick(stop_time, &mut sink);

        assert_eq!(sink.note_ons.len(), 18); // 3 iterations * 2 chords * 3 tones
        scheduler.stop(stop_time, &mut sink);
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
        assert!(sink.note_ons.iter().all(|&(_, t)| t <= stop_time));

        let note_on_count_before_further_ticks = sink.note_ons.len();
        scheduler.tick(stop_time + 1000.0, &mut sink);
        assert_eq!(sink.note_ons.len(), note_on_count_before_further_ticks);
    }
}
