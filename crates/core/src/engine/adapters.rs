//! Input adapters (spec §4.13).
//!
//! Pointer, physical-keyboard, and MIDI-in events are translated into
//! `noteOn`/`noteOff` calls on C9 here, at the boundary the teacher's
//! own `events`/`input` modules occupy — the core never sees a DOM
//! event shape beyond this point.

use crate::engine::voices::NoteSink;
use crate::theory::pitch::Pitch;

/// Velocity used when the originating event carries none (spec
/// §4.13).
pub const DEFAULT_VELOCITY: f64 = 0.8;

/// One entry of the physical-key -> pitch mapping table.
#[derive(Debug, Clone, Copy)]
pub struct KeyMapping {
    pub key_code: &'static str,
    pub pitch: u8,
}

/// A single-octave-and-a-bit QWERTY layout mirroring a typical virtual
/// piano: the bottom letter row covers white keys, the number row
/// covers black keys, starting at middle C.
pub static DEFAULT_KEYBOARD_MAP: &[KeyMapping] = &[
    KeyMapping { key_code: "KeyZ", pitch: 60 },
    KeyMapping { key_code: "KeyS", pitch: 61 },
    KeyMapping { key_code: "KeyX", pitch: 62 },
    KeyMapping { key_code: "KeyD", pitch: 63 },
    KeyMapping { key_code: "KeyC", pitch: 64 },
    KeyMapping { key_code: "KeyV", pitch: 65 },
    KeyMapping { key_code: "KeyG", pitch: 66 },
    KeyMapping { key_code: "KeyB", pitch: 67 },
    KeyMapping { key_code: "KeyH", pitch: 68 },
    KeyMapping { key_code: "KeyN", pitch: 69 },
    KeyMapping { key_code: "KeyJ", pitch: 70 },
    KeyMapping { key_code: "KeyM", pitch: 71 },
    KeyMapping { key_code: "Comma", pitch: 72 },
];

fn key_to_pitch(key_code: &str) -> Option<Pitch> {
    DEFAULT_KEYBOARD_MAP
        .iter()
        .find(|mapping| mapping.key_code == key_code)
        .and_then(|mapping| Pitch::new(i32::from(mapping.pitch)).ok())
}

/// Translates `keydown`/`keyup`-style events, deduplicated by the host
/// (auto-repeat is the host's concern, not this adapter's).
pub fn keyboard_key_down(key_code: &str, sink: &mut impl NoteSink, at_time: f64) {
    if let Some(pitch) = key_to_pitch(key_code) {
        sink.note_on(pitch, DEFAULT_VELOCITY, at_time);
    }
}

pub fn keyboard_key_up(key_code: &str, sink: &mut impl NoteSink, at_time: f64) {
    if let Some(pitch) = key_to_pitch(key_code) {
        sink.note_off(pitch, at_time);
    }
}

/// Translates a pointer-down/up at a position already mapped to a
/// pitch by the host's on-screen keyboard layout (pixel geometry is a
/// presentation concern, out of scope here).
pub fn pointer_down(pitch: Pitch, velocity: Option<f64>, sink: &mut impl NoteSink, at_time: f64) {
    sink.note_on(pitch, velocity.unwrap_or(DEFAULT_VELOCITY), at_time);
}

pub fn pointer_up(pitch: Pitch, sink: &mut impl NoteSink, at_time: f64) {
    sink.note_off(pitch, at_time);
}

/// MIDI channel to accept; other channels are filtered out (spec
/// §4.13: "MIDI channel filtering").
#[derive(Debug, Clone, Copy)]
pub struct MidiFilter {
    pub accepted_channel: Option<u8>,
}

impl Default for MidiFilter {
    fn default() -> Self {
        Self { accepted_channel: None }
    }
}

const NOTE_ON_STATUS: u8 = 0x90;
const NOTE_OFF_STATUS: u8 = 0x80;

/// Translates a raw `(status, data1, data2)` MIDI message. A note-on
/// with velocity 0 is treated as a note-off per the MIDI convention.
pub fn midi_message(filter: MidiFilter, status: u8, data1: u8, data2: u8, sink: &mut impl NoteSink, at_time: f64) {
    let channel = status & 0x0f;
    if let Some(accepted) = filter.accepted_channel {
        if channel != accepted {
            return;
        }
    }
    let Ok(pitch) = Pitch::new(i32::from(data1)) else {
        return;
    };
    match status & 0xf0 {
        NOTE_ON_STATUS if data2 > 0 => {
            let velocity = f64::from(data2) / 127.0;
            sink.note_on(pitch, velocity, at_time);
        }
        NOTE_ON_STATUS | NOTE_OFF_STATUS => sink.note_off(pitch, at_time),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        note_ons: Vec<(u8, f64)>,
        note_offs: Vec<u8>,
    }
    impl NoteSink for RecordingSink {
        fn note_on(&mut self, pitch: Pitch, velocity: f64, _at_time: f64) {
            self.note_ons.push((pitch.value(), velocity));
        }
        fn note_off(&mut self, pitch: Pitch, _at_time: f64) {
            self.note_offs.push(pitch.value());
        }
    }

    #[test]
    fn keyboard_maps_known_key_to_its_pitch() {
        let mut sink = RecordingSink::default();
        keyboard_key_down("KeyZ", &mut sink, 0.0);
        assert_eq!(sink.note_ons, vec![(60, DEFAULT_VELOCITY)]);
        keyboard_key_up("KeyZ", &mut sink, 0.0);
        assert_eq!(sink.note_offs, vec![60]);
    }

    #[test]
    fn unknown_key_is_silently_ignored() {
        let mut sink = RecordingSink::default();
        keyboard_key_down("F13", &mut sink, 0.0);
        assert!(sink.note_ons.is_empty());
    }

    #[test]
    fn midi_note_on_with_zero_velocity_is_treated_as_note_off() {
        let mut sink = RecordingSink::default();
        midi_message(MidiFilter::default(), NOTE_ON_STATUS, 60, 0, &mut sink, 0.0);
        assert_eq!(sink.note_offs, vec![60]);
        assert!(sink.note_ons.is_empty());
    }

    #[test]
    fn midi_channel_filter_rejects_other_channels() {
        let filter = MidiFilter { accepted_channel: Some(2) };
        let mut sink = RecordingSink::default();
        midi_message(filter, NOTE_ON_STATUS | 0x01, 60, 100, &mut sink, 0.0);
        assert!(sink.note_ons.is_empty());
        midi_message(filter, NOTE_ON_STATUS | 0x02, 60, 100, &mut sink, 0.0);
        assert_eq!(sink.note_ons.len(), 1);
    }

    #[test]
    fn pointer_defaults_velocity_when_none_given() {
        let mut sink = RecordingSink::default();
        pointer_down(Pitch::new(67).unwrap(), None, &mut sink, 0.0);
        assert_eq!(sink.note_ons, vec![(67, DEFAULT_VELOCITY)]);
    }
}
